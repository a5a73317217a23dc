use anyhow::anyhow;
use axum::{
    http::{
        HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_MAX_AGE,
        },
    },
    response::{IntoResponse, Response},
};
use config::CorsConfig;
use tower_http::set_header::SetResponseHeaderLayer;

pub(crate) const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// CORS headers of the gateway, rendered once at startup.
#[derive(Debug, Clone)]
pub(crate) struct CorsPolicy {
    allow_origin: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig) -> anyhow::Result<Self> {
        let origin = config.origin();

        let allow_origin =
            HeaderValue::from_str(origin).map_err(|e| anyhow!("Invalid CORS allow_origin '{origin}': {e}"))?;

        Ok(Self {
            allow_origin,
            max_age: HeaderValue::from(config.max_age.as_secs()),
        })
    }

    /// Answer to a browser preflight: no body, every CORS header.
    pub fn preflight(&self) -> Response {
        (
            StatusCode::NO_CONTENT,
            [
                (ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone()),
                (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS)),
                (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS)),
                (ACCESS_CONTROL_MAX_AGE, self.max_age.clone()),
            ],
        )
            .into_response()
    }

    /// Adds `Access-Control-Allow-Origin` to every response, including errors
    /// produced before a handler runs, so browsers can read every body.
    pub fn layer(&self) -> SetResponseHeaderLayer<HeaderValue> {
        SetResponseHeaderLayer::if_not_present(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone())
    }
}
