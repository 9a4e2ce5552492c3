use std::sync::Arc;

use chat_provider::{ChatProvider, ProviderInitError};
use chat_provider_gemini::{GeminiProvider, GeminiProviderConfig, GEMINI_PROVIDER_ID};
use chat_provider_mock::{MockProvider, MOCK_PROVIDER_ID};

pub const DEFAULT_PROVIDER_ID: &str = GEMINI_PROVIDER_ID;
pub const PROVIDER_ENV_VAR: &str = "YLDL4U_PROVIDER";
pub const MODEL_ENV_VAR: &str = "YLDL4U_MODEL";
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const API_KEY_FALLBACK_ENV_VAR: &str = "API_KEY";

pub fn provider_from_env() -> Result<Arc<dyn ChatProvider>, ProviderInitError> {
    let provider_id = env_value(PROVIDER_ENV_VAR);
    provider_for_id(provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID))
}

pub fn provider_for_id(provider_id: &str) -> Result<Arc<dyn ChatProvider>, ProviderInitError> {
    match provider_id {
        GEMINI_PROVIDER_ID => Ok(Arc::new(gemini_provider_from_env()?)),
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        unknown => Err(ProviderInitError::new(format!(
            "Unsupported provider '{unknown}'. Available providers: {GEMINI_PROVIDER_ID}, {MOCK_PROVIDER_ID}"
        ))),
    }
}

fn gemini_provider_from_env() -> Result<GeminiProvider, ProviderInitError> {
    let api_key = env_value(API_KEY_ENV_VAR)
        .or_else(|| env_value(API_KEY_FALLBACK_ENV_VAR))
        .ok_or_else(|| {
            ProviderInitError::new(format!(
                "Missing Gemini API key. Set {API_KEY_ENV_VAR} (or {API_KEY_FALLBACK_ENV_VAR})."
            ))
        })?;
    let model_id = env_value(MODEL_ENV_VAR).unwrap_or_default();

    GeminiProvider::new(GeminiProviderConfig::new(api_key, model_id))
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard, OnceLock};

    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }

            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn provider_for_id_supports_mock() {
        let provider = provider_for_id("mock").expect("mock provider should resolve");
        assert_eq!(provider.profile().provider_id, "mock");
    }

    #[test]
    fn provider_for_id_rejects_unknown_provider() {
        let error = match provider_for_id("custom") {
            Ok(_) => panic!("unknown providers should fail"),
            Err(error) => error,
        };

        assert!(error.message().contains("Unsupported provider 'custom'"));
        assert!(error.message().contains("gemini, mock"));
    }

    #[test]
    fn gemini_provider_requires_an_api_key() {
        let _env_serialization = lock_unpoisoned(env_lock());
        let _key = EnvVarGuard::set(API_KEY_ENV_VAR, None);
        let _fallback = EnvVarGuard::set(API_KEY_FALLBACK_ENV_VAR, None);

        let error = match provider_for_id(GEMINI_PROVIDER_ID) {
            Ok(_) => panic!("gemini provider requires a key"),
            Err(error) => error,
        };

        assert!(error.message().contains("Missing Gemini API key"));
    }

    #[test]
    fn gemini_provider_accepts_fallback_key_and_model_override() {
        let _env_serialization = lock_unpoisoned(env_lock());
        let _key = EnvVarGuard::set(API_KEY_ENV_VAR, None);
        let _fallback = EnvVarGuard::set(API_KEY_FALLBACK_ENV_VAR, Some("test-key"));
        let _model = EnvVarGuard::set(MODEL_ENV_VAR, Some("gemini-2.5-pro"));

        let provider = provider_for_id(GEMINI_PROVIDER_ID).expect("fallback key should resolve");
        let profile = provider.profile();

        assert_eq!(profile.provider_id, "gemini");
        assert_eq!(profile.model_id, "gemini-2.5-pro");
    }

    #[test]
    fn provider_from_env_defaults_to_gemini() {
        let _env_serialization = lock_unpoisoned(env_lock());
        let _provider = EnvVarGuard::set(PROVIDER_ENV_VAR, None);
        let _key = EnvVarGuard::set(API_KEY_ENV_VAR, Some("test-key"));
        let _model = EnvVarGuard::set(MODEL_ENV_VAR, None);

        let provider = provider_from_env().expect("default provider should resolve");
        assert_eq!(provider.profile().provider_id, "gemini");
    }

    #[test]
    fn provider_from_env_honors_override() {
        let _env_serialization = lock_unpoisoned(env_lock());
        let _provider = EnvVarGuard::set(PROVIDER_ENV_VAR, Some("mock"));

        let provider = provider_from_env().expect("mock override should resolve");
        assert_eq!(provider.profile().provider_id, "mock");
    }
}
