//! Provider adapters: one wire dialect per upstream provider family.

pub mod claude;
pub mod gemini;
pub mod openai;

use crate::types::{PromptPair, StreamDelta};
use crate::Error;
use serde_json::Value;
use std::collections::HashMap;

/// A fully built upstream HTTP request.
///
/// Produced per generation call and never reused, since the headers embed
/// the caller's credential.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

/// The closed set of supported wire dialects.
///
/// Adapters are stateless and safe to share across concurrent sessions.
/// `OpenAiCompatible` serves every provider speaking the OpenAI chat wire
/// format, including proxy/router providers with their own base URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAdapter {
    OpenAiCompatible,
    Gemini,
    Claude,
}

impl ProviderAdapter {
    /// Endpoint base used when configuration supplies no override.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderAdapter::OpenAiCompatible => openai::DEFAULT_BASE_URL,
            ProviderAdapter::Gemini => gemini::DEFAULT_BASE_URL,
            ProviderAdapter::Claude => claude::DEFAULT_BASE_URL,
        }
    }

    /// Build the provider-specific request for one prompt pair.
    ///
    /// Deterministic, no I/O. The body requests streaming output when
    /// `streaming` is true; how is dialect-specific (body flag for OpenAI
    /// and Claude, endpoint action plus query flag for Gemini).
    pub fn build_request(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        prompts: &PromptPair,
        streaming: bool,
    ) -> Result<UpstreamRequest, Error> {
        match self {
            ProviderAdapter::OpenAiCompatible => {
                openai::build_request(base_url, model, api_key, prompts, streaming)
            }
            ProviderAdapter::Gemini => {
                gemini::build_request(base_url, model, api_key, prompts, streaming)
            }
            ProviderAdapter::Claude => {
                claude::build_request(base_url, model, api_key, prompts, streaming)
            }
        }
    }

    /// Pull the generated text out of a complete non-streaming response.
    /// Returns an empty string when the expected path is absent.
    pub fn extract_content(&self, response: &Value) -> String {
        match self {
            ProviderAdapter::OpenAiCompatible => openai::extract_content(response),
            ProviderAdapter::Gemini => gemini::extract_content(response),
            ProviderAdapter::Claude => claude::extract_content(response),
        }
    }

    /// Map one decoded stream payload to a delta.
    ///
    /// Never fails: control and metadata payloads, and payloads outside the
    /// expected shape, yield an all-absent delta.
    pub fn parse_stream_payload(&self, payload: &Value) -> StreamDelta {
        match self {
            ProviderAdapter::OpenAiCompatible => openai::parse_stream_payload(payload),
            ProviderAdapter::Gemini => gemini::parse_stream_payload(payload),
            ProviderAdapter::Claude => claude::parse_stream_payload(payload),
        }
    }
}

/// A provider id resolved against the registry.
#[derive(Debug, Clone)]
pub struct RegisteredProvider {
    pub adapter: ProviderAdapter,
    /// Registry-level base URL, overriding the adapter default. Configuration
    /// overrides still win over both.
    pub base_url: Option<String>,
}

impl RegisteredProvider {
    /// Base URL after applying the configuration override, if any.
    pub fn resolve_base_url(&self, config_override: Option<&str>) -> String {
        config_override
            .map(str::to_string)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| self.adapter.default_base_url().to_string())
    }
}

/// Immutable map from provider id to adapter, injected into the gateway.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: HashMap<String, RegisteredProvider>,
}

impl ProviderRegistry {
    /// An empty registry; register providers with the `with_*` builders.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in provider set.
    pub fn builtin() -> Self {
        Self::new()
            .with_provider("openai", ProviderAdapter::OpenAiCompatible)
            .with_provider("gemini", ProviderAdapter::Gemini)
            .with_provider("claude", ProviderAdapter::Claude)
            .with_provider_at(
                "openrouter",
                ProviderAdapter::OpenAiCompatible,
                "https://openrouter.ai/api/v1",
            )
    }

    /// Register a provider id using the adapter's default base URL.
    pub fn with_provider(mut self, id: impl Into<String>, adapter: ProviderAdapter) -> Self {
        self.entries.insert(
            id.into(),
            RegisteredProvider {
                adapter,
                base_url: None,
            },
        );
        self
    }

    /// Register a provider id with a registry-level base URL override.
    pub fn with_provider_at(
        mut self,
        id: impl Into<String>,
        adapter: ProviderAdapter,
        base_url: impl Into<String>,
    ) -> Self {
        self.entries.insert(
            id.into(),
            RegisteredProvider {
                adapter,
                base_url: Some(base_url.into()),
            },
        );
        self
    }

    /// Look up a provider id.
    pub fn resolve(&self, id: &str) -> Option<&RegisteredProvider> {
        self.entries.get(id)
    }
}
