//! Process-wide provider settings.
//!
//! Read once at startup and handed to the session factory; nothing else in
//! the crate looks at the environment for credentials.

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderSettings {
    pub fn from_env(config_base_url: Option<&str>) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), config_base_url)
    }

    /// Resolves settings through `lookup` instead of the real environment.
    ///
    /// A missing key is logged and tolerated: sessions are still created and
    /// the first send fails instead.
    pub fn from_lookup<F>(lookup: F, config_base_url: Option<&str>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());

        if api_key.is_none() {
            warn!(
                "No API key found in {}; requests will be sent unauthenticated",
                API_KEY_VARS.join(" or ")
            );
        }

        let base_url = lookup(BASE_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| config_base_url.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self { api_key, base_url }
    }
}
