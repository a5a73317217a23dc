use serde::Deserialize;

use crate::messages::{
    ChatChoice, ChatCompletionResponse, ChatMessage, ChatRole, FinishReason, ObjectType, ResponseStamp, Usage,
};

/// The part of a backend result the gateway relies on.
///
/// Only `result.response` is required; `success`, `errors` and any other field
/// the backend sends are ignored.
#[derive(Debug, Deserialize)]
pub(super) struct WorkersAiResponse {
    result: WorkersAiResult,
}

#[derive(Debug, Deserialize)]
struct WorkersAiResult {
    response: String,
}

impl WorkersAiResponse {
    /// Parse a backend result, failing when `result.response` is missing or not a string.
    pub(super) fn parse(body: &str) -> crate::Result<Self> {
        sonic_rs::from_str(body).map_err(|e| {
            log::error!("Failed to parse backend result: {e}");
            log::error!("Raw backend result that failed to parse: {body}");

            crate::error::LlmError::Translation("The backend result did not contain a `result.response` text".to_string())
        })
    }

    /// Wrap the backend text into a single-choice chat completion.
    pub(super) fn into_chat_completion(self, model: &str, stamp: ResponseStamp) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: stamp.id,
            object: ObjectType::ChatCompletion,
            created: stamp.created,
            model: model.to_string(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: ChatRole::Assistant,
                    content: self.result.response,
                },
                finish_reason: FinishReason::Stop,
            }],
            usage: Usage::UNREPORTED,
        }
    }
}
