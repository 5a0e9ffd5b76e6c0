use serde::Deserialize;
use std::collections::HashMap;

/// A read-only snapshot of the stored generation configuration.
///
/// The configuration store itself is external; the gateway receives one
/// snapshot per request and never writes back. Field names follow the
/// store's camelCase JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Id of the selected provider, e.g. "openai" or "claude".
    pub provider: String,
    /// API keys per provider id.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Model name for the selected provider.
    #[serde(default)]
    pub model: String,
    /// Free-form model name; overrides `model` when present.
    #[serde(default)]
    pub custom_model: Option<String>,
    /// Global base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Base URL overrides per provider id.
    #[serde(default)]
    pub base_urls: HashMap<String, String>,
}

impl GenerationConfig {
    /// API key for the selected provider, if one is stored and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_keys
            .get(&self.provider)
            .map(String::as_str)
            .filter(|key| !key.is_empty())
    }

    /// Model to request: `custom_model` wins over `model`.
    pub fn effective_model(&self) -> &str {
        match &self.custom_model {
            Some(custom) if !custom.is_empty() => custom,
            _ => &self.model,
        }
    }

    /// Base URL override for a provider: the per-provider entry wins over
    /// the global one.
    pub fn base_url_for(&self, provider: &str) -> Option<&str> {
        self.base_urls
            .get(provider)
            .or(self.base_url.as_ref())
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}
