use serde::Serialize;

use crate::messages::{ChatCompletionRequest, ChatMessage, ChatRole};

/// Request body for the backend's `ai/run` endpoint.
///
/// The backend takes a single prompt string instead of a message list. Unset
/// sampling fields are omitted from the payload, never defaulted.
#[derive(Debug, PartialEq, Serialize)]
pub(super) struct WorkersAiRequest {
    pub(super) prompt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) stream: Option<bool>,
}

impl From<ChatCompletionRequest> for WorkersAiRequest {
    fn from(request: ChatCompletionRequest) -> Self {
        let ChatCompletionRequest {
            model: _,
            messages,
            temperature,
            max_tokens,
            stream,
        } = request;

        Self {
            prompt: render_prompt(&messages),
            temperature,
            max_tokens,
            stream,
        }
    }
}

/// One newline-terminated line per message, in order, prefixed by role.
pub(super) fn render_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();

    for message in messages {
        let prefix = match message.role {
            ChatRole::System => "Instructions",
            ChatRole::Assistant => "Assistant",
            ChatRole::User => "Human",
        };

        prompt.push_str(prefix);
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }

    prompt
}
