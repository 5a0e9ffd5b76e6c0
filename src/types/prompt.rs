use serde::Deserialize;
use serde_json::Value;

/// A system/user prompt pair, constructed once per generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    system: String,
    user: String,
}

impl PromptPair {
    /// Create a prompt pair from system and user text.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// The system prompt.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The user prompt.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Both prompts joined into one combined prompt, for dialects without a
    /// dedicated system channel.
    pub fn combined(&self) -> String {
        if self.system.is_empty() {
            self.user.clone()
        } else {
            format!("{}\n\n{}", self.system, self.user)
        }
    }
}

/// An inbound generation request from a session.
///
/// `action` selects how prompts are constructed, never which provider is
/// used; the provider comes from configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub action: String,
    pub subtitles: Option<String>,
    pub content: Option<String>,
    pub title: Option<String>,
    /// Action-specific fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl GenerationRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_subtitles(mut self, subtitles: impl Into<String>) -> Self {
        self.subtitles = Some(subtitles.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Maps an inbound request to the prompt pair sent upstream.
///
/// Prompt template text lives outside this crate; implementations are
/// injected into the gateway.
pub trait PromptBuilder: Send + Sync + 'static {
    fn build(&self, request: &GenerationRequest) -> PromptPair;
}

impl<F> PromptBuilder for F
where
    F: Fn(&GenerationRequest) -> PromptPair + Send + Sync + 'static,
{
    fn build(&self, request: &GenerationRequest) -> PromptPair {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_prompt() {
        let pair = PromptPair::new("Summarize.", "Some text");
        assert_eq!(pair.combined(), "Summarize.\n\nSome text");

        let no_system = PromptPair::new("", "Some text");
        assert_eq!(no_system.combined(), "Some text");
    }

    #[test]
    fn test_request_deserializes_extra_fields() {
        let request: GenerationRequest = serde_json::from_value(serde_json::json!({
            "action": "summarize",
            "subtitles": "line one\nline two",
            "title": "A video",
            "language": "en"
        }))
        .unwrap();

        assert_eq!(request.action, "summarize");
        assert_eq!(request.subtitles.as_deref(), Some("line one\nline two"));
        assert_eq!(request.content, None);
        assert_eq!(
            request.extra.get("language").and_then(Value::as_str),
            Some("en")
        );
    }

    #[test]
    fn test_closure_prompt_builder() {
        let builder = |request: &GenerationRequest| {
            PromptPair::new("sys", request.content.clone().unwrap_or_default())
        };
        let pair = builder.build(&GenerationRequest::new("summarize").with_content("hello"));
        assert_eq!(pair.user(), "hello");
    }
}
