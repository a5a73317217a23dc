pub mod backend;

use std::{net::SocketAddr, time::Duration};

use config::Config;
use reqwest::Method;
use secrecy::SecretString;
use server::ServeConfig;
use tokio::net::TcpListener;
use tokio::time::timeout;

pub use backend::{BackendMock, BackendServer, ReceivedRequest};

pub const TEST_ACCOUNT_ID: &str = "test-account";
pub const TEST_API_TOKEN: &str = "test-token";

/// Test client for making HTTP requests to the test server
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    /// Create a new test client for the given base URL
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a POST request to the given path with JSON body
    pub async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// Send a POST request with a body sent as-is
    pub async fn post_raw(&self, path: &str, body: impl Into<String>) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .send()
            .await
            .unwrap()
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    /// Start a request with any method
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }
}

/// Builds a gateway pointed at a backend stub.
#[derive(Default)]
pub struct TestServerBuilder {
    backend_url: Option<String>,
    without_credentials: bool,
}

impl TestServerBuilder {
    /// Route backend calls to the given stub.
    pub fn backend(mut self, backend: &BackendServer) -> Self {
        self.backend_url = Some(backend.base_url());
        self
    }

    /// Route backend calls to an arbitrary base URL.
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Leave account id and token as the TOML configuration sets them.
    pub fn without_credentials(mut self) -> Self {
        self.without_credentials = true;
        self
    }

    /// Start the gateway with the given TOML configuration
    pub async fn build(self, config_toml: &str) -> TestServer {
        let mut config: Config = toml::from_str(config_toml).unwrap();

        if let Some(url) = self.backend_url {
            config.llm.backend.base_url = url;
        }

        if !self.without_credentials {
            config.llm.backend.account_id = Some(SecretString::from(TEST_ACCOUNT_ID.to_string()));
            config.llm.backend.api_token = Some(SecretString::from(TEST_API_TOKEN.to_string()));
        }

        config.validate().unwrap();

        TestServer::start(config).await
    }
}

/// Test server that manages the lifecycle of a server instance
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::default()
    }

    async fn start(config: Config) -> Self {
        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
        };

        let (tx, mut rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            // Drop the listener so the server can bind to the address
            drop(listener);

            let _ = tx.send(server::serve(serve_config).await);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;

        if let Ok(Err(e)) = rx.try_recv() {
            eprintln!("Server failed to start: {e}");
            std::process::exit(1);
        }

        let client = TestClient::new(format!("http://{address}"));

        // Verify the server is actually running
        let mut retries = 10;
        while retries > 0 {
            if timeout(Duration::from_millis(100), client.request(Method::GET, "/").send())
                .await
                .is_ok_and(|response| response.is_ok())
            {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestServer {
            client,
            address,
            _handle: handle,
        }
    }
}

/// An address nothing listens on.
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
