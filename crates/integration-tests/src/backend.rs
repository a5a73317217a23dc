//! A stub of the single-prompt inference service.

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};

use serde::Serialize;
use tokio::net::TcpListener;

/// A request as the backend received it.
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedRequest {
    pub account_id: String,
    pub model: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
enum Reply {
    Text(String),
    Error { status: StatusCode, body: String },
    Raw(serde_json::Value),
    Stream(Vec<String>),
}

/// Builder for the backend stub.
pub struct BackendMock {
    reply: Reply,
}

impl Default for BackendMock {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendMock {
    pub fn new() -> Self {
        Self {
            reply: Reply::Text("Hello from the backend".to_string()),
        }
    }

    /// Answer with `{"result": {"response": text}}`.
    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.reply = Reply::Text(text.into());
        self
    }

    /// Answer with the given status and raw body.
    pub fn with_error(mut self, status: u16, body: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status).unwrap();

        self.reply = Reply::Error {
            status,
            body: body.into(),
        };

        self
    }

    /// Answer 200 with an arbitrary JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.reply = Reply::Raw(body);
        self
    }

    /// Answer with an event stream made of the given chunks.
    pub fn with_stream(mut self, chunks: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.reply = Reply::Stream(chunks.into_iter().map(Into::into).collect());
        self
    }

    pub async fn spawn(self) -> BackendServer {
        let state = Arc::new(BackendState {
            reply: self.reply,
            received: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/client/v4/accounts/{account_id}/ai/run/{*model}", post(run))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        BackendServer { address, state }
    }
}

struct BackendState {
    reply: Reply,
    received: Mutex<Vec<ReceivedRequest>>,
}

/// A running backend stub.
pub struct BackendServer {
    address: SocketAddr,
    state: Arc<BackendState>,
}

impl BackendServer {
    /// The base URL the gateway should be configured with.
    pub fn base_url(&self) -> String {
        format!("http://{}/client/v4/accounts", self.address)
    }

    /// Every request received so far, oldest first.
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.received.lock().unwrap().clone()
    }
}

async fn run(
    State(state): State<Arc<BackendState>>,
    Path((account_id, model)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.received.lock().unwrap().push(ReceivedRequest {
        account_id,
        model,
        authorization,
        body,
    });

    match state.reply.clone() {
        Reply::Text(text) => Json(serde_json::json!({
            "result": { "response": text },
            "success": true,
            "errors": [],
            "messages": []
        }))
        .into_response(),
        Reply::Error { status, body } => (status, body).into_response(),
        Reply::Raw(body) => Json(body).into_response(),
        Reply::Stream(chunks) => {
            let stream = futures::stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk))),
            );

            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
    }
}
