use std::sync::Arc;

use axum::response::Response;
use config::{CorsConfig, LlmConfig};

use crate::{
    cors::CorsPolicy,
    error::LlmError,
    messages::{ChatCompletionRequest, ChatCompletionResponse, ModelsResponse, ObjectType},
    provider::{Provider, RelayedStream, workers_ai::WorkersAiProvider},
};

#[derive(Clone)]
pub(crate) struct LlmServer {
    shared: Arc<LlmServerInner>,
}

struct LlmServerInner {
    provider: Box<dyn Provider>,
    cors: CorsPolicy,
}

impl LlmServer {
    pub fn new(config: &LlmConfig, cors: &CorsConfig) -> anyhow::Result<Self> {
        let cors = CorsPolicy::new(cors)?;

        let provider = WorkersAiProvider::new(config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize the inference backend: {e}"))?;

        log::debug!(
            "Chat gateway initialized with provider '{}' (streaming relay: {})",
            provider.name(),
            provider.supports_streaming()
        );

        Ok(Self {
            shared: Arc::new(LlmServerInner {
                provider: Box::new(provider),
                cors,
            }),
        })
    }

    /// Fails before any parsing when the backend cannot be reached with the current credentials.
    pub fn ensure_configured(&self) -> crate::Result<()> {
        self.shared.provider.ensure_configured()
    }

    /// Process a buffered chat completion request.
    pub async fn completions(&self, request: ChatCompletionRequest) -> crate::Result<ChatCompletionResponse> {
        self.shared.provider.chat_completion(request).await
    }

    /// Process a streaming chat completion request.
    pub async fn completions_stream(&self, request: ChatCompletionRequest) -> crate::Result<RelayedStream> {
        if !self.supports_streaming() {
            return Err(LlmError::InternalError(Some(
                "Streaming is disabled for this gateway".to_string(),
            )));
        }

        self.shared.provider.chat_completion_stream(request).await
    }

    pub fn supports_streaming(&self) -> bool {
        self.shared.provider.supports_streaming()
    }

    pub fn list_models(&self) -> ModelsResponse {
        ModelsResponse {
            object: ObjectType::List,
            data: self.shared.provider.list_models(),
        }
    }

    pub fn preflight(&self) -> Response {
        self.shared.cors.preflight()
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.shared.cors
    }
}
