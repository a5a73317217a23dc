//! Promptbridge configuration structures to map the promptbridge.toml configuration.

#![deny(missing_docs)]

mod cors;
mod health;
mod llm;
mod loader;
mod server;
mod tls;

use std::path::Path;

pub use cors::CorsConfig;
pub use health::HealthConfig;
pub use llm::{BackendConfig, LlmConfig};
pub use server::ServerConfig;
pub use tls::TlsServerConfig;

use serde::Deserialize;

/// Main configuration structure for the Promptbridge application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Chat gateway and inference backend configuration settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates paths, the backend URL and the model routing table.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}
