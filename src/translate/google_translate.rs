//! Google Translate API v2 provider
//!
//! Sends a form-encoded `{target, q, key}` request and reads the translated text
//! from `data.translations[0].translatedText`.
//!
//! # Authentication
//!
//! The API key travels in the form body. Obtain a key from
//! https://console.cloud.google.com/

use crate::translate::error::{TranslateError, TranslateResult};
use crate::translate::translator::{TranslationProvider, parse_json, read_provider_body};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Default endpoint of the Google Translate v2 REST API
pub const DEFAULT_GOOGLE_TRANSLATE_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

/// Google Translate API v2 provider
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client shared with the rest of the relay
    client: reqwest::Client,
    /// Endpoint receiving the form POST
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Create a new provider posting to `base_url` with `api_key`
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(TranslateError::Config)` - If the API key is empty
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> TranslateResult<Self> {
        if api_key.trim().is_empty() {
            return Err(TranslateError::Config("API key cannot be empty".to_string()));
        }

        Ok(Self {
            api_key,
            client,
            base_url,
        })
    }

    /// Extract the first translated text from a v2 response body
    ///
    /// The documented shape nests the array under `data`; a bare `translations`
    /// array is accepted as well.
    fn extract_translation(json: &Value) -> TranslateResult<String> {
        let translations = json
            .pointer("/data/translations")
            .or_else(|| json.get("translations"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                TranslateError::ParseFailure(
                    "missing 'data.translations' array".to_string(),
                )
            })?;

        let first = translations.first().ok_or_else(|| {
            TranslateError::ParseFailure("'translations' array is empty".to_string())
        })?;

        first["translatedText"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                TranslateError::ParseFailure("missing 'translatedText' field".to_string())
            })
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    async fn translate(&self, text: &str, target_language: &str) -> TranslateResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        debug!(target_language, "Start Google translate");
        let response = self
            .client
            .post(&self.base_url)
            .form(&[
                ("target", target_language),
                ("q", text),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let body = read_provider_body(response).await?;
        let json = parse_json(&body)?;
        let translated = Self::extract_translation(&json)?;
        debug!("Google translate completed");
        Ok(translated)
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
