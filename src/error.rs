use crate::translate::TranslateError;

/// Failures that end an invocation with an error instead of a response
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Fatal; reported before any network call is attempted
    #[error("{0}")]
    Configuration(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Only produced under `TranslationFailurePolicy::Retry`
    #[error(transparent)]
    Translate(#[from] TranslateError),
    /// The messaging endpoint answered 5xx or could not be reached
    #[error("{0}")]
    DeliveryUnavailable(String),
}

impl RelayError {
    /// Whether the invoker should run the whole invocation again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::DeliveryUnavailable(_) | RelayError::Translate(_)
        )
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
