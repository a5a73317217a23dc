pub(crate) mod workers_ai;

use std::pin::Pin;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use futures::Stream;

use crate::messages::{ChatCompletionRequest, ChatCompletionResponse, Model};

/// Raw body bytes of a backend response, relayed without interpretation.
pub(crate) type ByteStream = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>;

/// A streamed backend response passed through to the caller as-is.
pub(crate) struct RelayedStream {
    pub(crate) content_type: HeaderValue,
    pub(crate) body: ByteStream,
}

impl IntoResponse for RelayedStream {
    fn into_response(self) -> Response {
        ([(CONTENT_TYPE, self.content_type)], Body::from_stream(self.body)).into_response()
    }
}

/// Trait for inference backends reachable through the gateway.
///
/// Note for async_trait: the server keeps the provider behind `Box<dyn Provider>`,
/// so the trait must stay dyn-compatible.
#[async_trait]
pub(crate) trait Provider: Send + Sync {
    /// Fails with a configuration error when credentials are missing.
    /// Called before the request body is parsed and before any backend call.
    fn ensure_configured(&self) -> crate::Result<()>;

    /// Translate the request, call the backend and translate its result.
    async fn chat_completion(&self, request: ChatCompletionRequest) -> crate::Result<ChatCompletionResponse>;

    /// Forward the request with its stream flag and relay the backend body.
    async fn chat_completion_stream(&self, _request: ChatCompletionRequest) -> crate::Result<RelayedStream> {
        Err(crate::error::LlmError::InternalError(Some(
            "Streaming is not supported by this backend".to_string(),
        )))
    }

    /// Whether `stream: true` requests are relayed instead of buffered.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Front-facing models this provider answers for.
    fn list_models(&self) -> Vec<Model>;

    /// Get the provider name.
    fn name(&self) -> &str;
}
