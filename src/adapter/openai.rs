//! OpenAI-compatible chat completions dialect.
//!
//! Also used by proxy/router providers that speak the same wire format;
//! reasoning deltas arrive as `reasoning_content` (DeepSeek dialect) or
//! `reasoning` (router dialect) on the message delta.

use super::UpstreamRequest;
use crate::types::{PromptPair, StreamDelta};
use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completions request body.
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Non-streaming response, reduced to the path we read.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// One streaming chunk payload.
#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: MessageDelta,
}

#[derive(Debug, Default, Deserialize)]
struct MessageDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
    reasoning: Option<String>,
}

pub(crate) fn build_request(
    base_url: &str,
    model: &str,
    api_key: &str,
    prompts: &PromptPair,
    streaming: bool,
) -> Result<UpstreamRequest, Error> {
    let body = ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: prompts.system().to_string(),
            },
            ChatMessage {
                role: "user",
                content: prompts.user().to_string(),
            },
        ],
        stream: streaming,
    };

    Ok(UpstreamRequest {
        url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        headers: vec![("Authorization".to_string(), format!("Bearer {api_key}"))],
        body: serde_json::to_value(body)?,
    })
}

pub(crate) fn extract_content(response: &Value) -> String {
    match ChatResponse::deserialize(response) {
        Ok(parsed) => parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

pub(crate) fn parse_stream_payload(payload: &Value) -> StreamDelta {
    let chunk = match ChatStreamChunk::deserialize(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::debug!("openai payload outside expected chunk shape: {e}");
            return StreamDelta::default();
        }
    };

    let Some(choice) = chunk.choices.into_iter().next() else {
        return StreamDelta::default();
    };

    StreamDelta {
        content: choice.delta.content.filter(|s| !s.is_empty()),
        reasoning: choice
            .delta
            .reasoning_content
            .or(choice.delta.reasoning)
            .filter(|s| !s.is_empty()),
    }
}
