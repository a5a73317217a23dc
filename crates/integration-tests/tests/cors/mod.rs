use indoc::indoc;
use integration_tests::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn preflight_on_chat_endpoint() {
    // Preflight is answered before credentials are checked
    let server = TestServer::builder().without_credentials().build("").await;

    let response = server
        .client
        .request(Method::OPTIONS, "/v1/chat/completions")
        .header("Origin", "https://example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type, Authorization");
    assert_eq!(headers["access-control-max-age"], "86400");

    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn preflight_without_origin_header() {
    let server = TestServer::builder().build("").await;

    let response = server
        .client
        .request(Method::OPTIONS, "/v1/chat/completions")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn preflight_on_models_endpoint() {
    let server = TestServer::builder().build("").await;

    let response = server
        .client
        .request(Method::OPTIONS, "/v1/models")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["access-control-allow-methods"], "POST, OPTIONS");
}

#[tokio::test]
async fn configured_origin_and_max_age() {
    let config = indoc! {r#"
        [server.cors]
        allow_origin = "https://chat.example.com"
        max_age = "10m"
    "#};

    let server = TestServer::builder().build(config).await;

    let response = server
        .client
        .request(Method::OPTIONS, "/v1/chat/completions")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://chat.example.com"
    );
    assert_eq!(response.headers()["access-control-max-age"], "600");
}

#[tokio::test]
async fn error_responses_carry_origin() {
    let config = indoc! {r#"
        [server.cors]
        allow_origin = "https://chat.example.com"
    "#};

    let server = TestServer::builder().build(config).await;

    let response = server.client.post_raw("/v1/chat/completions", "{not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://chat.example.com"
    );

    let response = server.client.get("/v1/chat/completions").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://chat.example.com"
    );
}

#[tokio::test]
async fn configuration_error_carries_origin() {
    let server = TestServer::builder().without_credentials().build("").await;

    let request = json!({
        "model": "gpt-3.5-turbo",
        "messages": [{ "role": "user", "content": "Hi" }]
    });

    let response = server.client.post("/v1/chat/completions", &request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
