use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use config::{CorsConfig, LlmConfig};
use messages::ChatCompletionRequest;

mod cors;
mod error;
mod messages;
mod model_router;
mod provider;
mod server;

use error::LlmError;
use server::LlmServer;

pub(crate) type Result<T> = std::result::Result<T, LlmError>;

/// Creates an axum router for the chat gateway endpoints.
pub async fn router(config: LlmConfig, cors: &CorsConfig) -> anyhow::Result<Router> {
    let server = LlmServer::new(&config, cors)?;
    let cors_layer = server.cors().layer();

    let router = Router::new()
        .route(&config.path, any(chat_completions))
        .route(&config.models_path, get(list_models).options(preflight))
        .with_state(server)
        .layer(cors_layer);

    Ok(router)
}

/// Single entry point of the chat endpoint.
///
/// Preflight is answered first, then the method is checked, then the backend
/// credentials, and only then is the body parsed. Every answer carries the
/// CORS origin header through the router layer.
async fn chat_completions(State(server): State<LlmServer>, method: Method, body: Bytes) -> Result<Response> {
    if method == Method::OPTIONS {
        return Ok(server.preflight());
    }

    if method != Method::POST {
        return Err(LlmError::MethodNotAllowed(method));
    }

    server.ensure_configured()?;

    let request: ChatCompletionRequest =
        serde_json::from_slice(&body).map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

    log::info!("Chat completion requested for model: {}", request.model);
    log::debug!("Request has {} messages", request.messages.len());

    if request.stream == Some(true) && server.supports_streaming() {
        let stream = server.completions_stream(request).await?;

        log::debug!("Relaying streamed backend response");
        return Ok(stream.into_response());
    }

    let response = server.completions(request).await?;
    log::debug!("Chat completion successful");

    Ok(Json(response).into_response())
}

/// Handle list models requests.
async fn list_models(State(server): State<LlmServer>) -> impl IntoResponse {
    let response = server.list_models();

    log::debug!("Returning {} models", response.data.len());
    Json(response)
}

async fn preflight(State(server): State<LlmServer>) -> Response {
    server.preflight()
}
