//! Process-wide relay configuration
//!
//! Read once from the environment at start-up and passed by reference into every
//! component constructor. Nothing below reads the environment afterwards.

use crate::error::{RelayError, RelayResult};
use crate::translate::{
    DEFAULT_GOOGLE_TRANSLATE_URL, GoogleTranslateProvider, TranslationProvider,
    YoudaoTranslateProvider, normalize_language, validate_language,
};
use std::str::FromStr;
use std::sync::Arc;

pub const ENV_HOOK_URL: &str = "RELAY_HOOK_URL";
pub const ENV_AUTHORIZATION: &str = "RELAY_AUTHORIZATION";
pub const ENV_TRANSLATE_PROVIDER: &str = "RELAY_TRANSLATE_PROVIDER";
pub const ENV_TRANSLATE_URL: &str = "RELAY_TRANSLATE_URL";
pub const ENV_TRANSLATE_KEY: &str = "RELAY_TRANSLATE_KEY";
pub const ENV_TARGET_LANGUAGE: &str = "RELAY_TARGET_LANGUAGE";
pub const ENV_LANGUAGES: &str = "RELAY_LANGUAGES";
pub const ENV_DEFAULT_CHANNEL: &str = "RELAY_DEFAULT_CHANNEL";
pub const ENV_CLASSIFIER_MODE: &str = "RELAY_CLASSIFIER_MODE";
pub const ENV_COMMENT_FALLBACK: &str = "RELAY_COMMENT_FALLBACK";
pub const ENV_TRANSLATION_FAILURES: &str = "RELAY_TRANSLATION_FAILURES";

const DEFAULT_TARGET_LANGUAGE: &str = "en";
const DEFAULT_LANGUAGES: [&str; 3] = ["ja", "ko", "vi"];

/// Which translation provider the relay talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Google,
    Youdao,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "youdao" => Ok(ProviderKind::Youdao),
            other => Err(format!("unknown translation provider '{}'", other)),
        }
    }
}

/// Where the classifier looks for the text and language of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierMode {
    /// Language and text come from attachment fields; no attachments, no translation
    #[default]
    Attachments,
    /// The message text is translated; attachments are optional
    Plain,
}

impl FromStr for ClassifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "attachments" => Ok(ClassifierMode::Attachments),
            "plain" => Ok(ClassifierMode::Plain),
            other => Err(format!("unknown classifier mode '{}'", other)),
        }
    }
}

/// Text used when a `lang` field is present but no `comment` field is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentFallback {
    #[default]
    Empty,
    MessageText,
}

impl FromStr for CommentFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "empty" => Ok(CommentFallback::Empty),
            "text" => Ok(CommentFallback::MessageText),
            other => Err(format!("unknown comment fallback '{}'", other)),
        }
    }
}

/// Whether translation failures can ask the invoker for a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationFailurePolicy {
    /// Log and finish successfully
    #[default]
    Absorb,
    /// Propagate transient failures (5xx, network) as retry-worthy errors
    Retry,
}

impl FromStr for TranslationFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "absorb" => Ok(TranslationFailurePolicy::Absorb),
            "retry" => Ok(TranslationFailurePolicy::Retry),
            other => Err(format!("unknown translation failure policy '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct TranslationConfig {
    pub provider: ProviderKind,
    pub url: String,
    pub api_key: Option<String>,
    pub target_language: String,
}

impl TranslationConfig {
    /// Build the configured provider around a shared HTTP client
    pub fn build_provider(
        &self,
        client: reqwest::Client,
    ) -> RelayResult<Arc<dyn TranslationProvider>> {
        match self.provider {
            ProviderKind::Google => {
                let key = self.api_key.clone().unwrap_or_default();
                let provider = GoogleTranslateProvider::new(client, self.url.clone(), key)
                    .map_err(|e| RelayError::Configuration(e.to_string()))?;
                Ok(Arc::new(provider))
            }
            ProviderKind::Youdao => Ok(Arc::new(YoudaoTranslateProvider::new(
                client,
                self.url.clone(),
            ))),
        }
    }
}

impl std::fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("target_language", &self.target_language)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassifierConfig {
    pub mode: ClassifierMode,
    /// Normalized codes of the languages that need translation
    pub languages: Vec<String>,
    pub comment_fallback: CommentFallback,
    pub default_channel: Option<String>,
}

#[derive(Clone)]
pub struct RelayConfig {
    /// Messaging endpoint; every invocation fails fast while this is unset
    pub hook_url: Option<String>,
    /// Sent verbatim as the `Authorization` header on delivery
    pub authorization: Option<String>,
    pub translation: TranslationConfig,
    pub classifier: ClassifierConfig,
    pub translation_failures: TranslationFailurePolicy,
}

impl RelayConfig {
    /// Load the configuration from process environment variables
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration from an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let provider: ProviderKind = parse_choice(var(ENV_TRANSLATE_PROVIDER), ENV_TRANSLATE_PROVIDER)?;
        let url = match (var(ENV_TRANSLATE_URL), provider) {
            (Some(url), _) => url,
            (None, ProviderKind::Google) => DEFAULT_GOOGLE_TRANSLATE_URL.to_string(),
            (None, ProviderKind::Youdao) => {
                return Err(RelayError::Configuration(format!(
                    "{} must be set for the Youdao provider",
                    ENV_TRANSLATE_URL
                )));
            }
        };

        let target_language =
            var(ENV_TARGET_LANGUAGE).unwrap_or_else(|| DEFAULT_TARGET_LANGUAGE.to_string());
        validate_language(&target_language)
            .map_err(|e| RelayError::Configuration(e.to_string()))?;

        let languages = match var(ENV_LANGUAGES) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(normalize_language)
                .collect(),
            None => DEFAULT_LANGUAGES.iter().map(|code| code.to_string()).collect(),
        };

        Ok(Self {
            hook_url: var(ENV_HOOK_URL),
            authorization: var(ENV_AUTHORIZATION),
            translation: TranslationConfig {
                provider,
                url,
                api_key: var(ENV_TRANSLATE_KEY),
                target_language,
            },
            classifier: ClassifierConfig {
                mode: parse_choice(var(ENV_CLASSIFIER_MODE), ENV_CLASSIFIER_MODE)?,
                languages,
                comment_fallback: parse_choice(var(ENV_COMMENT_FALLBACK), ENV_COMMENT_FALLBACK)?,
                default_channel: var(ENV_DEFAULT_CHANNEL),
            },
            translation_failures: parse_choice(
                var(ENV_TRANSLATION_FAILURES),
                ENV_TRANSLATION_FAILURES,
            )?,
        })
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("hook_url", &self.hook_url)
            .field("authorization", &self.authorization.as_ref().map(|_| "***"))
            .field("translation", &self.translation)
            .field("classifier", &self.classifier)
            .field("translation_failures", &self.translation_failures)
            .finish()
    }
}

fn parse_choice<T>(value: Option<String>, name: &str) -> RelayResult<T>
where
    T: FromStr<Err = String> + Default,
{
    match value {
        Some(value) => value
            .parse()
            .map_err(|e| RelayError::Configuration(format!("{}: {}", name, e))),
        None => Ok(T::default()),
    }
}
