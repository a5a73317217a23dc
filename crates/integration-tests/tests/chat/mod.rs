use indoc::indoc;
use integration_tests::{BackendMock, TestServer, closed_address};
use reqwest::{Method, StatusCode, header};
use serde_json::json;

const CHAT_PATH: &str = "/v1/chat/completions";

fn concise_hi() -> serde_json::Value {
    json!({
        "model": "gpt-3.5-turbo",
        "messages": [
            { "role": "system", "content": "Be concise" },
            { "role": "user", "content": "Hi" }
        ]
    })
}

#[tokio::test]
async fn translates_request_and_response() {
    let backend = BackendMock::new().with_response("Hello!").spawn().await;

    let config = indoc! {r#"
        [llm.backend.models]
        "gpt-3.5-turbo" = "X"
    "#};

    let server = TestServer::builder().backend(&backend).build(config).await;
    let response = server.client.post(CHAT_PATH, &concise_hi()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let body: serde_json::Value = response.json().await.unwrap();

    insta::with_settings!({ sort_maps => true }, {
        insta::assert_json_snapshot!(body, {
            ".id" => "[id]",
            ".created" => "[created]"
        }, @r#"
        {
          "choices": [
            {
              "finish_reason": "stop",
              "index": 0,
              "message": {
                "content": "Hello!",
                "role": "assistant"
              }
            }
          ],
          "created": "[created]",
          "id": "[id]",
          "model": "cloudflare-proxy",
          "object": "chat.completion",
          "usage": {
            "completion_tokens": -1,
            "prompt_tokens": -1,
            "total_tokens": -1
          }
        }
        "#);
    });

    let id = body["id"].as_str().unwrap();
    assert_eq!(id.len(), 36);
    assert!(body["created"].as_u64().unwrap() > 1_700_000_000);

    let received = backend.received();
    assert_eq!(received.len(), 1);

    let request = &received[0];
    assert_eq!(request.account_id, "test-account");
    assert_eq!(request.model, "X");
    assert_eq!(request.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(request.body, json!({ "prompt": "Instructions: Be concise\nHuman: Hi\n" }));
}

#[tokio::test]
async fn every_response_gets_a_fresh_id() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    let first: serde_json::Value = server.client.post(CHAT_PATH, &concise_hi()).await.json().await.unwrap();
    let second: serde_json::Value = server.client.post(CHAT_PATH, &concise_hi()).await.json().await.unwrap();

    assert_ne!(first["id"], second["id"]);
    assert_eq!(first["choices"], second["choices"]);
}

#[tokio::test]
async fn unknown_model_uses_default() {
    let backend = BackendMock::new().spawn().await;

    let config = indoc! {r#"
        [llm.backend]
        default_model = "@cf/meta/llama-3-8b-instruct"

        [llm.backend.models]
        "gpt-3.5-turbo" = "X"
    "#};

    let server = TestServer::builder().backend(&backend).build(config).await;

    let request = json!({
        "model": "gpt-5",
        "messages": [{ "role": "user", "content": "Hi" }]
    });

    let response = server.client.post(CHAT_PATH, &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let received = backend.received();
    assert_eq!(received[0].model, "@cf/meta/llama-3-8b-instruct");
}

#[tokio::test]
async fn empty_table_routes_everything_to_default() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    server.client.post(CHAT_PATH, &concise_hi()).await;

    let received = backend.received();
    assert_eq!(received[0].model, "@cf/deepseek-ai/deepseek-math-7b-instruct");
}

#[tokio::test]
async fn sampling_fields_forwarded_when_set() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    let request = json!({
        "model": "gpt-4",
        "messages": [
            { "role": "user", "content": "What is 2+2?" },
            { "role": "assistant", "content": "4" },
            { "role": "tool", "content": "calculator says 4" }
        ],
        "temperature": 0.5,
        "max_tokens": 100
    });

    let response = server.client.post(CHAT_PATH, &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let received = backend.received();

    assert_eq!(
        received[0].body,
        json!({
            "prompt": "Human: What is 2+2?\nAssistant: 4\nHuman: calculator says 4\n",
            "temperature": 0.5,
            "max_tokens": 100
        })
    );
}

#[tokio::test]
async fn empty_messages_send_empty_prompt() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    let request = json!({ "model": "gpt-4", "messages": [] });

    let response = server.client.post(CHAT_PATH, &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(backend.received()[0].body, json!({ "prompt": "" }));
}

#[tokio::test]
async fn method_not_allowed() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let response = server.client.request(method.clone(), CHAT_PATH).send().await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST, OPTIONS");

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": format!("Method {method} not allowed") }));
    }

    assert!(backend.received().is_empty());
}

#[tokio::test]
async fn missing_credentials_fail_before_parsing() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder()
        .backend(&backend)
        .without_credentials()
        .build("")
        .await;

    // An unparseable body still gets the configuration error
    let response = server.client.post_raw(CHAT_PATH, "{not json").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(
        body,
        json!({
            "error": "Server configuration error",
            "details": "The backend account id is not configured"
        })
    );

    assert!(backend.received().is_empty());
}

#[tokio::test]
async fn missing_token_is_a_configuration_error() {
    let backend = BackendMock::new().spawn().await;

    let config = indoc! {r#"
        [llm.backend]
        account_id = "acc-123"
    "#};

    let server = TestServer::builder()
        .backend(&backend)
        .without_credentials()
        .build(config)
        .await;

    let response = server.client.post(CHAT_PATH, &concise_hi()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["details"], "The backend API token is not configured");

    assert!(backend.received().is_empty());
}

#[tokio::test]
async fn invalid_json_is_a_bad_request() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    let response = server.client.post_raw(CHAT_PATH, "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request: "));
    assert!(body.get("details").is_none());

    assert!(backend.received().is_empty());
}

#[tokio::test]
async fn missing_messages_is_a_bad_request() {
    let backend = BackendMock::new().spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    let response = server.client.post(CHAT_PATH, &json!({ "model": "gpt-4" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("messages"));

    assert!(backend.received().is_empty());
}

#[tokio::test]
async fn backend_error_status_is_propagated() {
    let backend = BackendMock::new()
        .with_error(503, r#"{"error":"overloaded"}"#)
        .spawn()
        .await;

    let server = TestServer::builder().backend(&backend).build("").await;

    let response = server.client.post(CHAT_PATH, &concise_hi()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(
        body,
        json!({
            "error": "Backend API error (503)",
            "details": r#"{"error":"overloaded"}"#
        })
    );
}

#[tokio::test]
async fn backend_auth_error_is_propagated() {
    let backend = BackendMock::new()
        .with_error(401, "Authentication error")
        .spawn()
        .await;

    let server = TestServer::builder().backend(&backend).build("").await;

    let response = server.client.post(CHAT_PATH, &concise_hi()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["details"], "Authentication error");
}

#[tokio::test]
async fn unreachable_backend() {
    let address = closed_address().await;

    let server = TestServer::builder()
        .backend_url(format!("http://{address}/client/v4/accounts"))
        .build("")
        .await;

    let response = server.client.post(CHAT_PATH, &concise_hi()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(
        body,
        json!({
            "error": "Failed to reach the inference backend",
            "details": "An error occurred while processing your request."
        })
    );
}

#[tokio::test]
async fn unexpected_backend_shape() {
    let backend = BackendMock::new()
        .with_body(json!({ "result": {}, "success": true }))
        .spawn()
        .await;

    let server = TestServer::builder().backend(&backend).build("").await;

    let response = server.client.post(CHAT_PATH, &concise_hi()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(
        body,
        json!({
            "error": "Unexpected response from the inference backend",
            "details": "The backend result did not contain a `result.response` text"
        })
    );
}

#[tokio::test]
async fn streaming_is_relayed() {
    let chunks = [
        "data: {\"response\":\"Hel\"}\n\n",
        "data: {\"response\":\"lo\"}\n\n",
        "data: [DONE]\n\n",
    ];

    let backend = BackendMock::new().with_stream(chunks).spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    let mut request = concise_hi();
    request["stream"] = json!(true);

    let response = server.client.post(CHAT_PATH, &request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let body = response.text().await.unwrap();
    assert_eq!(body, chunks.concat());

    let received = backend.received();
    assert_eq!(received[0].body["stream"], json!(true));
}

#[tokio::test]
async fn streaming_disabled_uses_buffered_path() {
    let backend = BackendMock::new().with_response("Hello!").spawn().await;

    let config = indoc! {r#"
        [llm.backend]
        stream = false
    "#};

    let server = TestServer::builder().backend(&backend).build(config).await;

    let mut request = concise_hi();
    request["stream"] = json!(true);

    let response = server.client.post(CHAT_PATH, &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["choices"][0]["message"]["content"], "Hello!");

    let received = backend.received();
    assert!(received[0].body.get("stream").is_none());
}

#[tokio::test]
async fn stream_false_is_forwarded_and_buffered() {
    let backend = BackendMock::new().with_response("Hello!").spawn().await;
    let server = TestServer::builder().backend(&backend).build("").await;

    let mut request = concise_hi();
    request["stream"] = json!(false);

    let response = server.client.post(CHAT_PATH, &request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["object"], "chat.completion");

    assert_eq!(backend.received()[0].body["stream"], json!(false));
}

#[tokio::test]
async fn custom_chat_path() {
    let backend = BackendMock::new().spawn().await;

    let config = indoc! {r#"
        [llm]
        path = "/chat"
    "#};

    let server = TestServer::builder().backend(&backend).build(config).await;

    let response = server.client.post("/chat", &concise_hi()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.client.post(CHAT_PATH, &concise_hi()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
