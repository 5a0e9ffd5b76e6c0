//! Claude messages dialect.
//!
//! Auth is an `x-api-key` header plus a version header, and the system
//! prompt has its own request field. The stream interleaves typed control
//! events with content; only `content_block_delta` carries text, so every
//! other event kind maps to an empty delta rather than an error.

use super::UpstreamRequest;
use crate::types::{PromptPair, StreamDelta};
use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API rejects requests without a token budget; the session
/// protocol carries none, so all requests use this ceiling.
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ClaudeMessage>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

/// Non-streaming response, reduced to the content blocks.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClaudeContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Streaming events. The stream carries many kinds (`message_start`,
/// `content_block_start`, `ping`, `message_delta`, `message_stop`, ...);
/// everything except `content_block_delta` is control traffic.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClaudeStreamEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: ClaudeBlockDelta },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClaudeBlockDelta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(rename = "thinking_delta")]
    ThinkingDelta { thinking: String },
    #[serde(other)]
    Other,
}

pub(crate) fn build_request(
    base_url: &str,
    model: &str,
    api_key: &str,
    prompts: &PromptPair,
    streaming: bool,
) -> Result<UpstreamRequest, Error> {
    let system = prompts.system();
    let body = ClaudeRequest {
        model: model.to_string(),
        max_tokens: DEFAULT_MAX_TOKENS,
        system: (!system.is_empty()).then(|| system.to_string()),
        messages: vec![ClaudeMessage {
            role: "user",
            content: prompts.user().to_string(),
        }],
        stream: streaming,
    };

    Ok(UpstreamRequest {
        url: format!("{}/messages", base_url.trim_end_matches('/')),
        headers: vec![
            ("x-api-key".to_string(), api_key.to_string()),
            ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
        ],
        body: serde_json::to_value(body)?,
    })
}

pub(crate) fn extract_content(response: &Value) -> String {
    match ClaudeResponse::deserialize(response) {
        Ok(parsed) => parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text),
                ClaudeContentBlock::Other => None,
            })
            .collect(),
        Err(_) => String::new(),
    }
}

pub(crate) fn parse_stream_payload(payload: &Value) -> StreamDelta {
    let event = match ClaudeStreamEvent::deserialize(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("claude payload outside expected event shape: {e}");
            return StreamDelta::default();
        }
    };

    match event {
        ClaudeStreamEvent::ContentBlockDelta { delta } => match delta {
            ClaudeBlockDelta::TextDelta { text } => StreamDelta::content(text),
            ClaudeBlockDelta::ThinkingDelta { thinking } => StreamDelta::reasoning(thinking),
            ClaudeBlockDelta::Other => StreamDelta::default(),
        },
        ClaudeStreamEvent::Other => StreamDelta::default(),
    }
}
