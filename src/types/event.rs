//! Events crossing the session boundary, and the deltas they carry.

use serde::Serialize;

/// An incremental fragment extracted from one decoded upstream payload.
///
/// At most one field is typically present per payload; both absent means
/// "nothing displayable" and the payload is skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamDelta {
    /// Fragment of the generated answer text.
    pub content: Option<String>,
    /// Fragment of the model's reasoning trace.
    pub reasoning: Option<String>,
}

impl StreamDelta {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            reasoning: None,
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            content: None,
            reasoning: Some(text.into()),
        }
    }

    /// True when neither field carries text.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.reasoning.is_none()
    }
}

/// The only data sent from the gateway to a session.
///
/// Serializes to the session wire protocol:
/// `{"type":"chunk",...}`, `{"type":"done"}`, `{"type":"error",...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatewayEvent {
    Chunk {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    Done,
    Error {
        error: String,
    },
}

impl GatewayEvent {
    /// Wrap a non-empty delta into a chunk event.
    pub fn chunk(delta: StreamDelta) -> Self {
        GatewayEvent::Chunk {
            content: delta.content,
            reasoning: delta.reasoning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        GatewayEvent::Error {
            error: message.into(),
        }
    }
}
