use axum::{
    Json,
    http::{HeaderValue, Method, StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::cors::ALLOWED_METHODS;

const GENERIC_DETAILS: &str = "An error occurred while processing your request.";

/// Gateway errors with appropriate HTTP status codes.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Malformed body or missing required fields.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Anything but POST and OPTIONS on the chat endpoint.
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    /// Backend credentials or identifiers are missing from the configuration.
    #[error("Server configuration error")]
    Configuration(String),

    /// The backend answered with a non-success status.
    #[error("Backend API error ({status})")]
    BackendApi { status: u16, message: String },

    /// The backend call itself failed. The cause is logged, never returned to the caller.
    #[error("Failed to reach the inference backend")]
    Connection(String),

    /// The backend answered successfully but without `result.response`.
    #[error("Unexpected response from the inference backend")]
    Translation(String),

    /// Internal server error.
    /// If Some(message), the message is safe to show to the caller.
    #[error("Internal server error")]
    InternalError(Option<String>),
}

impl LlmError {
    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BackendApi { status, .. } => match StatusCode::from_u16(*status) {
                Ok(status) if status.is_client_error() || status.is_server_error() => status,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Configuration(_) | Self::Connection(_) | Self::Translation(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Extra context for the caller, if any may be shown.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::InvalidRequest(_) | Self::MethodNotAllowed(_) => None,
            Self::Configuration(message) | Self::Translation(message) => Some(message.clone()),
            Self::BackendApi { message, .. } => {
                let message = message.trim();
                (!message.is_empty()).then(|| message.to_string())
            }
            Self::Connection(_) | Self::InternalError(None) => Some(GENERIC_DETAILS.to_string()),
            Self::InternalError(Some(message)) => Some(message.clone()),
        }
    }
}

/// Error body returned on every failure path.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for LlmError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log all 5xx errors for administrators
        if status.is_server_error() {
            match &self {
                Self::Connection(cause) => log::error!("Backend transport failure: {cause}"),
                Self::Configuration(message) => log::error!("Configuration error: {message}"),
                Self::Translation(message) => log::error!("Translation error: {message}"),
                _ => log::error!("Server error ({}): {}", status.as_u16(), self),
            }
        }

        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::MethodNotAllowed(_) = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }

        response
    }
}
