mod input;
mod output;

use async_trait::async_trait;
use axum::http::{HeaderValue, header::CONTENT_TYPE};
use config::LlmConfig;
use futures::StreamExt;
use reqwest::{Client, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use self::{input::WorkersAiRequest, output::WorkersAiResponse};

use crate::{
    error::LlmError,
    messages::{ChatCompletionRequest, ChatCompletionResponse, Model, ResponseStamp},
    model_router::ModelRouter,
    provider::{Provider, RelayedStream},
};

const PROVIDER_NAME: &str = "workers-ai";

/// Single-prompt inference backend addressed as `{base_url}/{account_id}/ai/run/{model}`.
pub(crate) struct WorkersAiProvider {
    client: Client,
    base_url: String,
    account_id: Option<SecretString>,
    api_token: Option<SecretString>,
    models: ModelRouter,
    response_model: String,
    stream: bool,
}

impl WorkersAiProvider {
    pub fn new(config: &LlmConfig) -> crate::Result<Self> {
        let backend = &config.backend;

        let client = Client::builder().timeout(backend.timeout).build().map_err(|e| {
            log::error!("Failed to create HTTP client for the inference backend: {e}");
            LlmError::InternalError(None)
        })?;

        Ok(Self {
            client,
            base_url: backend.base_url.trim_end_matches('/').to_string(),
            account_id: backend.account_id.clone(),
            api_token: backend.api_token.clone(),
            models: ModelRouter::from_config(backend),
            response_model: config.response_model.clone(),
            stream: backend.stream,
        })
    }

    fn credentials(&self) -> crate::Result<(&SecretString, &SecretString)> {
        fn usable(value: &Option<SecretString>) -> Option<&SecretString> {
            value
                .as_ref()
                .filter(|secret| !secret.expose_secret().trim().is_empty())
        }

        match (usable(&self.account_id), usable(&self.api_token)) {
            (Some(account_id), Some(api_token)) => Ok((account_id, api_token)),
            (None, _) => Err(LlmError::Configuration(
                "The backend account id is not configured".to_string(),
            )),
            (_, None) => Err(LlmError::Configuration(
                "The backend API token is not configured".to_string(),
            )),
        }
    }

    /// Resolve the backend model and build the single-prompt payload.
    fn translate(&self, request: ChatCompletionRequest) -> (String, WorkersAiRequest) {
        let model = self.models.resolve(&request.model).to_string();
        let mut body = WorkersAiRequest::from(request);

        if !self.stream {
            body.stream = None;
        }

        (model, body)
    }

    async fn send(&self, model: &str, body: &WorkersAiRequest) -> crate::Result<reqwest::Response> {
        let (account_id, api_token) = self.credentials()?;
        let url = format!("{}/{}/ai/run/{model}", self.base_url, account_id.expose_secret());

        log::debug!("Sending request to backend model {model}");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", api_token.expose_secret()))
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Connection(format!("Failed to send request to the backend: {e}")))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Backend API error ({status}): {error_text}");

            return Err(LlmError::BackendApi {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for WorkersAiProvider {
    fn ensure_configured(&self) -> crate::Result<()> {
        self.credentials().map(|_| ())
    }

    async fn chat_completion(&self, request: ChatCompletionRequest) -> crate::Result<ChatCompletionResponse> {
        let (model, body) = self.translate(request);
        let response = self.send(&model, &body).await?;

        // Read as text first so a shape mismatch can be logged verbatim
        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::Connection(format!("Failed to read backend response body: {e}")))?;

        let result = WorkersAiResponse::parse(&response_text)?;

        Ok(result.into_chat_completion(&self.response_model, ResponseStamp::now()))
    }

    async fn chat_completion_stream(&self, request: ChatCompletionRequest) -> crate::Result<RelayedStream> {
        let (model, body) = self.translate(request);
        let response = self.send(&model, &body).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("text/event-stream"));

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                log::error!("Backend stream interrupted: {e}");
                LlmError::Connection(format!("Backend stream interrupted: {e}"))
            })
        });

        Ok(RelayedStream {
            content_type,
            body: Box::pin(body),
        })
    }

    fn supports_streaming(&self) -> bool {
        self.stream
    }

    fn list_models(&self) -> Vec<Model> {
        self.models.list(PROVIDER_NAME)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}
