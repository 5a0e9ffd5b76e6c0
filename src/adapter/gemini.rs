//! Gemini generateContent dialect.
//!
//! The API key travels as a query parameter and streaming is selected by
//! endpoint action name plus the `alt=sse` flag. There is no system-prompt
//! channel: system and user prompts are concatenated into one combined
//! prompt. Parts flagged `"thought": true` carry the reasoning trace.

use super::UpstreamRequest;
use crate::types::{PromptPair, StreamDelta};
use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiRequestPart {
    text: String,
}

/// Response/stream payload, reduced to the paths we read.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

pub(crate) fn build_request(
    base_url: &str,
    model: &str,
    api_key: &str,
    prompts: &PromptPair,
    streaming: bool,
) -> Result<UpstreamRequest, Error> {
    let action = if streaming {
        "streamGenerateContent"
    } else {
        "generateContent"
    };
    let sse_param = if streaming { "&alt=sse" } else { "" };

    let body = GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiRequestPart {
                text: prompts.combined(),
            }],
        }],
    };

    Ok(UpstreamRequest {
        url: format!(
            "{}/models/{}:{}?key={}{}",
            base_url.trim_end_matches('/'),
            model,
            action,
            api_key,
            sse_param
        ),
        headers: Vec::new(),
        body: serde_json::to_value(body)?,
    })
}

pub(crate) fn extract_content(response: &Value) -> String {
    match GeminiResponse::deserialize(response) {
        Ok(parsed) => collect(parsed).content.unwrap_or_default(),
        Err(_) => String::new(),
    }
}

pub(crate) fn parse_stream_payload(payload: &Value) -> StreamDelta {
    match GeminiResponse::deserialize(payload) {
        Ok(parsed) => collect(parsed),
        Err(e) => {
            tracing::debug!("gemini payload outside expected candidate shape: {e}");
            StreamDelta::default()
        }
    }
}

/// Fold a candidate's parts into one delta, routing thought parts to the
/// reasoning channel.
fn collect(response: GeminiResponse) -> StreamDelta {
    let mut content = String::new();
    let mut reasoning = String::new();

    for candidate in response.candidates.into_iter().take(1) {
        let Some(body) = candidate.content else {
            continue;
        };
        for part in body.parts {
            let Some(text) = part.text else { continue };
            if part.thought {
                reasoning.push_str(&text);
            } else {
                content.push_str(&text);
            }
        }
    }

    StreamDelta {
        content: (!content.is_empty()).then_some(content),
        reasoning: (!reasoning.is_empty()).then_some(reasoning),
    }
}
