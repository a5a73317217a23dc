//! Chat gateway configuration and the inference backend it fronts.

use std::{borrow::Cow, collections::BTreeMap, time::Duration};

use duration_str::deserialize_duration;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4/accounts";
const DEFAULT_MODEL: &str = "@cf/deepseek-ai/deepseek-math-7b-instruct";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// Whether the chat endpoints are mounted.
    enabled: bool,

    /// Path of the chat completion endpoint.
    pub path: Cow<'static, str>,

    /// Path of the model listing endpoint.
    pub models_path: Cow<'static, str>,

    /// Label reported in the `model` field of every chat completion.
    pub response_model: String,

    /// The inference service behind the gateway.
    pub backend: BackendConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: Cow::Borrowed("/v1/chat/completions"),
            models_path: Cow::Borrowed("/v1/models"),
            response_model: "cloudflare-proxy".to_string(),
            backend: BackendConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Whether the chat endpoints are mounted.
    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Connection and routing settings for the single-prompt inference service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL; requests go to `{base_url}/{account_id}/ai/run/{model}`.
    pub base_url: String,

    /// Account identifier placed in the request path.
    pub account_id: Option<SecretString>,

    /// Bearer token sent with every backend request.
    pub api_token: Option<SecretString>,

    /// Backend model used when the requested model has no entry in `models`.
    pub default_model: String,

    /// Front-facing model name to backend model identifier.
    pub models: BTreeMap<String, String>,

    /// Relay the backend body untouched when a client asks for a stream.
    /// When disabled the `stream` flag is not forwarded.
    pub stream: bool,

    /// Timeout for a single backend call.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            account_id: None,
            api_token: None,
            default_model: DEFAULT_MODEL.to_string(),
            models: BTreeMap::new(),
            stream: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BackendConfig {
    /// True when both the account identifier and the token are present and non-blank.
    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<SecretString>| {
            value
                .as_ref()
                .is_some_and(|secret| !secret.expose_secret().trim().is_empty())
        };

        present(&self.account_id) && present(&self.api_token)
    }
}
