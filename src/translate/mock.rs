//! Mock translation provider for testing
//!
//! Deterministic and network-free. Every call is counted so tests can assert
//! that a pipeline run never reached the translation stage.
//!
//! # Example
//!
//! ```ignore
//! use translate_relay::translate::{MockMode, MockTranslator, TranslationProvider};
//!
//! let mock = MockTranslator::new(MockMode::Suffix);
//! assert_eq!(mock.translate("hello", "fr").await.unwrap(), "hello_fr");
//! assert_eq!(mock.calls(), 1);
//! ```

use crate::translate::error::{TranslateError, TranslateResult};
use crate::translate::translator::TranslationProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target language: "hello" → "hello_fr"
    Suffix,

    /// (text, target_language) → translation; unknown pairs fall back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Behave like a provider answering with the given HTTP status
    Failure(u16),

    /// Behave like a provider answering 200 with an unusable body
    Malformed,

    /// Return input unchanged
    NoOp,
}

/// Mock translator that simulates provider behaviour
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `translate` calls made so far, across clones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn apply_translation(&self, text: &str, target: &str) -> TranslateResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Failure(status) => Err(TranslateError::ProviderFailure {
                status: *status,
                message: "mock provider failure".to_string(),
            }),
            MockMode::Malformed => Err(TranslateError::ParseFailure(
                "mock provider returned no translations".to_string(),
            )),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> TranslateResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.apply_translation(text, target_language)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_suffix_translation() {
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(mock.translate("hello", "fr").await.unwrap(), "hello_fr");
        assert_eq!(mock.translate("hello", "de").await.unwrap(), "hello_de");
    }

    #[tokio::test]
    async fn test_mapping_with_fallback() {
        let mut map = HashMap::new();
        map.insert(
            ("hello".to_string(), "ja".to_string()),
            "こんにちは".to_string(),
        );
        let mock = MockTranslator::new(MockMode::Mappings(map));
        assert_eq!(mock.translate("hello", "ja").await.unwrap(), "こんにちは");
        assert_eq!(mock.translate("unknown", "ja").await.unwrap(), "unknown_ja");
    }

    #[tokio::test]
    async fn test_failure_mode_reports_status() {
        let mock = MockTranslator::new(MockMode::Failure(500));
        match mock.translate("hello", "en").await {
            Err(TranslateError::ProviderFailure { status, .. }) => assert_eq!(status, 500),
            other => panic!("Expected ProviderFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_mode() {
        let mock = MockTranslator::new(MockMode::Malformed);
        assert!(matches!(
            mock.translate("hello", "en").await,
            Err(TranslateError::ParseFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_noop_returns_unchanged() {
        let mock = MockTranslator::new(MockMode::NoOp);
        assert_eq!(mock.translate("Hello world", "en").await.unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn test_calls_are_shared_between_clones() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let clone = mock.clone();
        clone.translate("a", "en").await.unwrap();
        mock.translate("b", "en").await.unwrap();
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.provider_name(), "Mock Translator");
    }
}
