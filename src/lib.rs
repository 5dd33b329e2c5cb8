//! Chat translation relay
//!
//! Receives a chat event (from a webhook call or a queue message), decides
//! whether it needs translating, translates it with the configured provider
//! and posts the result back to the messaging endpoint, usually as a threaded
//! reply to the source message.
//!
//! # Example
//!
//! ```ignore
//! use translate_relay::{Completion, Pipeline, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::from_env()?;
//!     let pipeline = Pipeline::from_config(&config)?;
//!
//!     let event = serde_json::json!({
//!         "event": {
//!             "type": "message",
//!             "channel": "C024BE91L",
//!             "event_ts": "1700000000.000100",
//!             "attachments": [{"fields": [
//!                 {"title": "lang", "value": "ja"},
//!                 {"title": "comment", "value": "こんにちは"}
//!             ]}]
//!         }
//!     });
//!     if let Completion::Response(response) = pipeline.handle(event).await? {
//!         println!("{}", response.body);
//!     }
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod delivery;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod server;
pub mod translate;


pub use classifier::{Classification, ClassifiedEvent, EventClassifier, SkipReason};
pub use config::{
    ClassifierConfig, ClassifierMode, CommentFallback, ProviderKind, RelayConfig,
    TranslationConfig, TranslationFailurePolicy,
};
pub use delivery::{DeliveryClient, DeliveryOutcome, OutboundMessage};
pub use error::{RelayError, RelayResult};
pub use event::{Attachment, AttachmentField, InboundEvent, PlatformEvent, RelayMessage, Trigger, TriggerKind};
pub use pipeline::{Completion, InvokerResponse, Outcome, Pipeline};
pub use translate::{TranslateError, TranslateResult, TranslationProvider};
