use std::{
    borrow::Cow,
    fmt,
    io::IsTerminal,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
};

use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use config::Config;
use logforth::filter::EnvFilter;
use secrecy::SecretString;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Parser)]
#[command(name = "Promptbridge", version, long_about = concat!("Promptbridge v", env!("CARGO_PKG_VERSION")))]
pub struct Args {
    /// IP address and port on which the server will listen for incoming connections.
    /// Default: 0.0.0.0:8000
    #[arg(short, long, env = "PROMPTBRIDGE_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,
    /// Port to listen on when no full listen address is given.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,
    /// Path to the TOML configuration file
    #[arg(long, short, env = "PROMPTBRIDGE_CONFIG_PATH", default_value = "./promptbridge.toml")]
    pub config: PathBuf,
    /// Account identifier of the inference backend.
    #[arg(long, env = "CF_ACCOUNT_ID", hide_env_values = true)]
    pub account_id: Option<String>,
    /// API token of the inference backend.
    #[arg(long, env = "CF_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
    /// Value of the Access-Control-Allow-Origin header. Default: *
    #[arg(long, env = "ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,
    /// Set the logging level for all workspace crates.
    #[arg(long = "log", env = "PROMPTBRIDGE_LOG", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
    /// Set the style of log output
    #[arg(long, env = "PROMPTBRIDGE_LOG_STYLE", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
}

impl Args {
    /// Reads the configuration file if present, then applies command line and environment overrides.
    pub fn config(&self) -> anyhow::Result<Config> {
        let config = if self.config.exists() {
            Config::load(&self.config)?
        } else {
            Config::default()
        };

        let config = self.apply_overrides(config);
        config.validate()?;

        Ok(config)
    }

    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(account_id) = &self.account_id {
            config.llm.backend.account_id = Some(SecretString::from(account_id.clone()));
        }

        if let Some(api_token) = &self.api_token {
            config.llm.backend.api_token = Some(SecretString::from(api_token.clone()));
        }

        if let Some(origin) = &self.allowed_origin {
            config.server.cors.allow_origin = Some(origin.clone());
        }

        config
    }

    /// Explicit address first, then the configured one, then all interfaces.
    /// A port given on its own only replaces the port.
    pub fn listen_address(&self, config: &Config) -> SocketAddr {
        if let Some(address) = self.listen_address {
            return address;
        }

        let mut address = config
            .server
            .listen_address
            .unwrap_or(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT));

        if let Some(port) = self.port {
            address.set_port(port);
        }

        address
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colorized text, used as the default with TTY output
    Color,
    /// Standard text, used as the default with non-TTY output
    Text,
    /// JSON objects
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        if std::io::stdout().is_terminal() {
            LogStyle::Color
        } else {
            LogStyle::Text
        }
    }
}

impl AsRef<str> for LogStyle {
    fn as_ref(&self) -> &str {
        match self {
            LogStyle::Color => "color",
            LogStyle::Text => "text",
            LogStyle::Json => "json",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum LogLevel {
    /// Disable logging
    Off,
    /// Only log errors
    Error,
    /// Log errors, and warnings
    Warn,
    /// Log errors, warnings, and info messages
    #[default]
    Info,
    /// Log errors, warnings, info, and debug messages
    Debug,
    /// Log errors, warnings, info, debug, and trace messages
    Trace,
}

impl LogLevel {
    fn filter_directive(self) -> Cow<'static, str> {
        match self {
            LogLevel::Off => Cow::Borrowed("off"),
            // Other crates stay at warn, workspace crates follow the selected level
            level => Cow::Owned(format!(
                "warn,promptbridge={level},server={level},config={level},llm={level}"
            )),
        }
    }

    pub fn env_filter(self) -> anyhow::Result<EnvFilter> {
        let directive = self.filter_directive();

        EnvFilter::from_str(&directive).map_err(|e| anyhow!("Invalid log filter '{directive}': {e}"))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
