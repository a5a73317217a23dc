use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OpenAI-compatible chat completion request.
///
/// Optional sampling fields stay `None` when the client omits them; the backend
/// treats an absent value differently from an explicit one.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatCompletionRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<ChatMessage>,
    #[serde(default)]
    pub(crate) temperature: Option<f64>,
    #[serde(default)]
    pub(crate) max_tokens: Option<u32>,
    #[serde(default)]
    pub(crate) stream: Option<bool>,
}

/// Chat message in OpenAI format.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct ChatMessage {
    pub(crate) role: ChatRole,
    pub(crate) content: String,
}

/// Role bucket of a chat message.
///
/// Anything other than `system` and `assistant` is treated as the user speaking,
/// including `user` itself, `tool`, or roles this gateway has never heard of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub(crate) enum ChatRole {
    System,
    Assistant,
    User,
}

impl From<String> for ChatRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "system" => ChatRole::System,
            "assistant" => ChatRole::Assistant,
            _ => ChatRole::User,
        }
    }
}

/// The `object` tag of a response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) enum ObjectType {
    #[serde(rename = "chat.completion")]
    ChatCompletion,
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "list")]
    List,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum FinishReason {
    Stop,
}

/// OpenAI-compatible chat completion response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChatCompletionResponse {
    pub(crate) id: String,
    pub(crate) object: ObjectType,
    pub(crate) created: u64,
    pub(crate) model: String,
    pub(crate) choices: Vec<ChatChoice>,
    pub(crate) usage: Usage,
}

/// Chat completion choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChatChoice {
    pub(crate) index: u32,
    pub(crate) message: ChatMessage,
    pub(crate) finish_reason: FinishReason,
}

/// Token usage information.
///
/// The backend reports no token counts, so every counter carries the `-1` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Usage {
    pub(crate) prompt_tokens: i32,
    pub(crate) completion_tokens: i32,
    pub(crate) total_tokens: i32,
}

impl Usage {
    pub(crate) const UNREPORTED: Usage = Usage {
        prompt_tokens: -1,
        completion_tokens: -1,
        total_tokens: -1,
    };
}

/// Identity and creation time given to a freshly built chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponseStamp {
    pub(crate) id: String,
    pub(crate) created: u64,
}

impl ResponseStamp {
    /// A random v4 UUID and the current Unix time in seconds.
    pub(crate) fn now() -> Self {
        let created = u64::try_from(jiff::Timestamp::now().as_second()).unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            created,
        }
    }
}

/// Model information.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Model {
    pub(crate) id: String,
    pub(crate) object: ObjectType,
    pub(crate) created: u64,
    pub(crate) owned_by: String,
}

/// Models list response.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ModelsResponse {
    pub(crate) object: ObjectType,
    pub(crate) data: Vec<Model>,
}
