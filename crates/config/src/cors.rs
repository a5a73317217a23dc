//! Cross-origin settings applied to every gateway response.

use std::time::Duration;

use duration_str::deserialize_duration;
use serde::Deserialize;

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Configuration for CORS (Cross-Origin Resource Sharing).
///
/// The allowed methods and headers are fixed by the gateway; only the origin and
/// the preflight cache lifetime can be tuned.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Origin sent in `Access-Control-Allow-Origin`. Unset means `*`.
    pub allow_origin: Option<String>,
    /// How long browsers may cache a preflight response.
    #[serde(deserialize_with = "deserialize_duration")]
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: None,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl CorsConfig {
    /// The origin to advertise, falling back to the wildcard.
    pub fn origin(&self) -> &str {
        self.allow_origin.as_deref().unwrap_or("*")
    }
}
