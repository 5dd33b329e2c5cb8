/// Error types for the translation stage
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// The provider answered with an HTTP status of 400 or above
    #[error("translation provider failure ({status}): {message}")]
    ProviderFailure { status: u16, message: String },
    /// The provider answered, but not with the expected JSON shape
    #[error("malformed translation response: {0}")]
    ParseFailure(String),
    /// The request never produced a response
    #[error("translation request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Provider construction failed
    #[error("translation provider misconfigured: {0}")]
    Config(String),
}

impl TranslateError {
    /// Whether retrying the same request later could succeed.
    ///
    /// Provider-side rejections (4xx) and malformed bodies are permanent;
    /// server errors and transport failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            TranslateError::ProviderFailure { status, .. } => *status >= 500,
            TranslateError::Network(_) => true,
            TranslateError::ParseFailure(_) | TranslateError::Config(_) => false,
        }
    }
}

/// Result type for translation operations
pub type TranslateResult<T> = Result<T, TranslateError>;
