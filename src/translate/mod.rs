/// Translation Module
///
/// One outbound call per translation, no retries. Providers differ only in
/// how they format the request and where the translated text sits in the
/// response; both concerns stay inside each provider.
///
/// # Example
///
/// ```ignore
/// use translate_relay::translate::{TranslationProvider, YoudaoTranslateProvider};
///
/// let provider = YoudaoTranslateProvider::new(reqwest::Client::new(), url);
/// let translated = provider.translate("早上好", "en").await?;
/// ```
pub mod error;
pub mod google_translate;
pub mod mock;
pub mod translator;
pub mod youdao_translate;

pub use error::{TranslateError, TranslateResult};
pub use google_translate::{DEFAULT_GOOGLE_TRANSLATE_URL, GoogleTranslateProvider};
pub use mock::{MockMode, MockTranslator};
pub use translator::{TranslationProvider, normalize_language, validate_language};
pub use youdao_translate::YoudaoTranslateProvider;
