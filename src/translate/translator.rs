//! Translation provider trait and language code helpers
//!
//! This module defines the `TranslationProvider` trait. Each provider
//! (Google Translate, Youdao, mock) formats its own request and normalizes its
//! own response shape into a single translated string.
//!
//! # Example
//!
//! ```ignore
//! use translate_relay::translate::{GoogleTranslateProvider, TranslationProvider};
//!
//! let provider = GoogleTranslateProvider::new(client, url, "api-key".to_string())?;
//! let result = provider.translate("こんにちは", "en").await?;
//! println!("{}", result); // "Hello"
//! ```

use crate::translate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;

/// Capability interface for machine translation providers
///
/// Implementations perform exactly one outbound call per `translate` and never
/// retry; whether a failure is worth retrying is decided by the pipeline.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` into `target_language`
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(TranslateError::ProviderFailure)` - The provider answered with status >= 400
    /// * `Err(TranslateError::ParseFailure)` - The response was not the expected JSON
    /// * `Err(TranslateError::Network)` - No response was received
    async fn translate(&self, text: &str, target_language: &str) -> TranslateResult<String>;

    /// Name of the provider, used in logs
    fn provider_name(&self) -> &str;
}

/// Normalize a language code by stripping region information
///
/// - `ja-JP` → `ja`
/// - `zh_Hans` → `zh`
/// - `KO` → `ko`
pub fn normalize_language(language: &str) -> String {
    language
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_lowercase()
}

/// Validate that a language code only contains alphanumerics, hyphens and underscores
pub fn validate_language(language: &str) -> TranslateResult<()> {
    if language.is_empty() {
        return Err(TranslateError::Config(
            "Language code is empty".to_string(),
        ));
    }

    if !language
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TranslateError::Config(format!(
            "Invalid characters in language code: {}",
            language
        )));
    }

    Ok(())
}

/// Check an HTTP response from a provider and hand back its body on success
///
/// Shared by the HTTP providers so that the status and parsing rules stay identical.
pub(crate) async fn read_provider_body(response: reqwest::Response) -> TranslateResult<String> {
    let status = response.status();
    if status.as_u16() >= 400 {
        let reason = status.canonical_reason().unwrap_or("Unknown error");
        let body = response.text().await.unwrap_or_default();
        let message = if body.is_empty() {
            reason.to_string()
        } else {
            format!("{} - {}", reason, body)
        };
        return Err(TranslateError::ProviderFailure {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.text().await?)
}

/// Parse a provider body as JSON, mapping syntax errors to `ParseFailure`
pub(crate) fn parse_json(body: &str) -> TranslateResult<serde_json::Value> {
    serde_json::from_str(body)
        .map_err(|e| TranslateError::ParseFailure(format!("response is not JSON: {}", e)))
}
