//! Classify → translate → deliver
//!
//! Every invocation starts from scratch and performs at most one translation
//! call followed by at most one delivery call. Only delivery failures reach
//! the invoker as errors; translation is best effort.
//!
//! # Example
//!
//! ```ignore
//! use translate_relay::{Pipeline, RelayConfig};
//!
//! let config = RelayConfig::from_env()?;
//! let pipeline = Pipeline::from_config(&config)?;
//! match pipeline.handle(raw_event).await {
//!     Ok(completion) => println!("{:?}", completion),
//!     Err(e) if e.is_retryable() => { /* let the host retry */ }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use crate::classifier::{Classification, EventClassifier, SkipReason};
use crate::config::{RelayConfig, TranslationFailurePolicy};
use crate::delivery::{DeliveryClient, DeliveryOutcome, OutboundMessage};
use crate::error::{RelayError, RelayResult};
use crate::event::{InboundEvent, Trigger, TriggerKind};
use crate::translate::TranslationProvider;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const HOOK_URL_MISSING: &str = "Hook URL has not been set.";

/// How a pipeline run ended, short of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Challenge(String),
    /// Translation failed and was absorbed; nothing was posted
    TranslationFailed(String),
    Delivered(OutboundMessage),
    /// The messaging endpoint refused the message; retrying cannot help
    Rejected(String),
}

impl Outcome {
    pub fn into_response(self) -> InvokerResponse {
        match self {
            Outcome::Skipped(_) | Outcome::TranslationFailed(_) => {
                InvokerResponse::success(&json!({"status": "success"}))
            }
            Outcome::Challenge(challenge) => {
                InvokerResponse::success(&json!({"challenge": challenge}))
            }
            Outcome::Delivered(message) => InvokerResponse::success(&json!({"message": message})),
            Outcome::Rejected(reason) => InvokerResponse::failure(reason),
        }
    }
}

/// HTTP-shaped answer returned to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokerResponse {
    pub status_code: String,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl InvokerResponse {
    fn new(status_code: &str, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code: status_code.to_string(),
            body,
            headers,
        }
    }

    pub fn success(body: &Value) -> Self {
        Self::new("200", body.to_string())
    }

    /// Final failure; the body is the bare error message
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new("400", message.into())
    }

    pub fn is_success(&self) -> bool {
        self.status_code == "200"
    }
}

/// What the invoker gets back from a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// HTTP and direct triggers
    Response(InvokerResponse),
    /// Queue triggers: the message is consumed, no envelope
    Acknowledged(Outcome),
}

pub struct Pipeline {
    classifier: EventClassifier,
    translator: Arc<dyn TranslationProvider>,
    delivery: Option<DeliveryClient>,
    target_language: String,
    translation_failures: TranslationFailurePolicy,
}

impl Pipeline {
    /// Build a pipeline around an already constructed provider
    pub fn new(
        config: &RelayConfig,
        translator: Arc<dyn TranslationProvider>,
        client: reqwest::Client,
    ) -> Self {
        let delivery = config.hook_url.as_ref().map(|hook_url| {
            DeliveryClient::new(client, hook_url.clone(), config.authorization.clone())
        });
        Self {
            classifier: EventClassifier::new(&config.classifier),
            translator,
            delivery,
            target_language: config.translation.target_language.clone(),
            translation_failures: config.translation_failures,
        }
    }

    /// Build a pipeline with the provider selected by `config`
    pub fn from_config(config: &RelayConfig) -> RelayResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            RelayError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        let translator = config.translation.build_provider(client.clone())?;
        Ok(Self::new(config, translator, client))
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    /// Fail with the configuration error when no delivery endpoint is set
    pub fn ensure_configured(&self) -> RelayResult<()> {
        self.delivery().map(|_| ())
    }

    fn delivery(&self) -> RelayResult<&DeliveryClient> {
        self.delivery
            .as_ref()
            .ok_or_else(|| RelayError::Configuration(HOOK_URL_MISSING.to_string()))
    }

    /// Run one invocation from its raw trigger payload
    pub async fn handle(&self, raw: Value) -> RelayResult<Completion> {
        self.ensure_configured()?;
        let trigger = Trigger::decode(raw)?;
        let event = InboundEvent::from_value(trigger.payload)?;
        let outcome = self.process(event).await?;
        Ok(match trigger.kind {
            TriggerKind::Queue => Completion::Acknowledged(outcome),
            TriggerKind::Http | TriggerKind::Direct => {
                Completion::Response(outcome.into_response())
            }
        })
    }

    /// Run one invocation for an already decoded event
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome)` - A final result; the invoker must not retry
    /// * `Err(RelayError)` - Check [`RelayError::is_retryable`]
    pub async fn process(&self, event: InboundEvent) -> RelayResult<Outcome> {
        let delivery = self.delivery()?;

        if let InboundEvent::UrlVerification { challenge } = event {
            return Ok(Outcome::Challenge(challenge));
        }

        let classified = match self.classifier.classify(&event) {
            Classification::Actionable(classified) => classified,
            Classification::NoActionNeeded(reason) => {
                debug!(%reason, "No translation needed");
                return Ok(Outcome::Skipped(reason));
            }
        };
        if classified.text.trim().is_empty() {
            debug!(channel = %classified.channel, "Nothing to translate");
            return Ok(Outcome::Skipped(SkipReason::EmptyText));
        }

        info!(
            provider = self.translator.provider_name(),
            source_language = classified.source_language.as_deref().unwrap_or("unknown"),
            target_language = %self.target_language,
            "Translating message"
        );
        let translated = match self
            .translator
            .translate(&classified.text, &self.target_language)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "Translation failed");
                if self.translation_failures == TranslationFailurePolicy::Retry && e.is_transient()
                {
                    return Err(e.into());
                }
                return Ok(Outcome::TranslationFailed(e.to_string()));
            }
        };

        let message = OutboundMessage {
            channel: classified.channel,
            text: translated,
            thread_ts: classified.thread_id,
        };
        match delivery.deliver(&message).await {
            DeliveryOutcome::Delivered => Ok(Outcome::Delivered(message)),
            DeliveryOutcome::RejectedByEndpoint(reason) => Ok(Outcome::Rejected(reason)),
            DeliveryOutcome::EndpointUnavailable(reason) => {
                Err(RelayError::DeliveryUnavailable(reason))
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("classifier", &self.classifier)
            .field("translator", &self.translator.provider_name())
            .field("delivery", &self.delivery)
            .field("target_language", &self.target_language)
            .field("translation_failures", &self.translation_failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_response() {
        let response = Outcome::Skipped(SkipReason::ThreadReply).into_response();
        assert_eq!(response.status_code, "200");
        assert_eq!(response.body, r#"{"status":"success"}"#);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_translation_failure_reads_as_success() {
        let response = Outcome::TranslationFailed("500".to_string()).into_response();
        assert!(response.is_success());
        assert_eq!(response.body, r#"{"status":"success"}"#);
    }

    #[test]
    fn test_delivered_response_echoes_message() {
        let response = Outcome::Delivered(OutboundMessage {
            channel: "C1".to_string(),
            text: "hi".to_string(),
            thread_ts: None,
        })
        .into_response();
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"message": {"channel": "C1", "text": "hi"}}));
    }

    #[test]
    fn test_rejected_response_is_final_400() {
        let response =
            Outcome::Rejected("Error posting message to Slack API: 403 - Forbidden".to_string())
                .into_response();
        assert_eq!(response.status_code, "400");
        assert_eq!(
            response.body,
            "Error posting message to Slack API: 403 - Forbidden"
        );
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let json = serde_json::to_value(InvokerResponse::failure("nope")).unwrap();
        assert_eq!(
            json,
            json!({
                "statusCode": "400",
                "body": "nope",
                "headers": {"Content-Type": "application/json"}
            })
        );
    }
}
