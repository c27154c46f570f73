use std::fmt::Debug;

/// Environment variable holding the OpenWeather API key.
pub const API_KEY_VAR: &str = "OWM_API_KEY";

/// Supplies the upstream credential at call time.
pub trait CredentialSource: Send + Sync + Debug {
    /// Name reported when the credential is missing.
    fn variable(&self) -> &'static str {
        API_KEY_VAR
    }

    fn api_key(&self) -> Option<String>;
}

/// Reads [`API_KEY_VAR`] from the process environment on every call.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    fallback: Option<String>,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `key` when the environment variable is unset or empty.
    pub fn with_fallback(key: Option<String>) -> Self {
        Self {
            fallback: key.filter(|k| !k.trim().is_empty()),
        }
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.fallback.clone())
    }
}

/// A fixed key, mostly for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Option<String>);

impl StaticCredentials {
    pub fn key(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self) -> Option<String> {
        self.0.clone().filter(|k| !k.trim().is_empty())
    }
}
