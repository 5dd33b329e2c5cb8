//! Youdao translation provider
//!
//! Sends a form-encoded `{q, to}` request and reads the translated text from the
//! first element of the `translation` array. Credentials, if any, are expected
//! to be part of the configured URL.

use crate::translate::error::{TranslateError, TranslateResult};
use crate::translate::translator::{TranslationProvider, parse_json, read_provider_body};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct YoudaoTranslateProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YoudaoTranslateProvider {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn extract_translation(json: &Value) -> TranslateResult<String> {
        json.get("translation")
            .and_then(Value::as_array)
            .and_then(|translations| translations.first())
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .ok_or_else(|| {
                TranslateError::ParseFailure(
                    "missing or empty 'translation' array".to_string(),
                )
            })
    }
}

#[async_trait]
impl TranslationProvider for YoudaoTranslateProvider {
    async fn translate(&self, text: &str, target_language: &str) -> TranslateResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        debug!(target_language, "Start Youdao translate");
        let response = self
            .client
            .post(&self.base_url)
            .form(&[("q", text), ("to", target_language)])
            .send()
            .await?;

        let body = read_provider_body(response).await?;
        let json = parse_json(&body)?;
        Self::extract_translation(&json)
    }

    fn provider_name(&self) -> &str {
        "Youdao"
    }
}
