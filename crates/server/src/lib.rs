//! Promptbridge server library.
//!
//! Provides a reusable server function for the binary and the integration tests.

#![deny(missing_docs)]

mod health;

use std::net::SocketAddr;

use anyhow::anyhow;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use config::Config;
use tokio::net::TcpListener;

/// Configuration for serving the gateway.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to
    pub listen_address: SocketAddr,
    /// The deserialized TOML configuration, with command line overrides applied.
    pub config: Config,
}

/// Starts and runs the gateway with the provided configuration.
pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> anyhow::Result<()> {
    let mut app = Router::new();

    if config.llm.enabled() {
        let llm_router = llm::router(config.llm.clone(), &config.server.cors)
            .await
            .map_err(|e| anyhow!("Failed to initialize the chat gateway: {e}"))?;

        app = app.merge(llm_router);

        if !config.llm.backend.is_configured() {
            log::warn!("Backend credentials are missing, chat completions will fail until they are configured");
        }
    } else {
        log::warn!("The chat gateway is disabled, only the health endpoint will be served");
    }

    if config.server.health.enabled {
        if let Some(listen) = config.server.health.listen {
            tokio::spawn(health::bind_health_endpoint(
                listen,
                config.server.tls.clone(),
                config.server.health.clone(),
            ));
        } else {
            app = app.merge(health::router(&config.server.health));
        }
    }

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    let scheme = if config.server.tls.is_some() { "https" } else { "http" };

    if config.llm.enabled() {
        log::info!(
            "Chat completions available at: {scheme}://{listen_address}{}",
            config.llm.path
        );
        log::info!("Model listing available at: {scheme}://{listen_address}{}", config.llm.models_path);
    }

    match &config.server.tls {
        Some(tls_config) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls_config.certificate, &tls_config.key)
                .await
                .map_err(|e| anyhow!("Failed to load TLS certificate and key: {e}"))?;

            axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                .serve(app.into_make_service())
                .await
                .map_err(|e| anyhow!("Failed to start HTTPS server: {e}"))?;
        }
        None => {
            axum::serve(listener, app)
                .await
                .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;
        }
    }

    Ok(())
}
