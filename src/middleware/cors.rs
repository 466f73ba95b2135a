//! CORS policy for the dashboard front-end.
//!
//! The session travels in a cookie, so cross-origin calls need credentials;
//! that rules out a wildcard origin even in development. The anti-forgery
//! header is both accepted and exposed so browser code can read and echo it.
//!
//! Policy:
//! - Production: exact-match allowlist from `CORS_ALLOWED_ORIGINS` (empty = none).
//! - Development: the allowlist plus any `http://localhost:*` origin.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;

pub fn apply(router: Router, config: &Config) -> Router {
    let allowed: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    let allow_localhost = !config.app_env.is_production();

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
        allowed.iter().any(|v| v == origin) || (allow_localhost && is_localhost(origin))
    });

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
            config.csrf_header_name.clone(),
        ])
        .expose_headers([config.csrf_header_name.clone()])
        .max_age(std::time::Duration::from_secs(60 * 10));

    router.layer(cors)
}

fn is_localhost(origin: &HeaderValue) -> bool {
    origin
        .to_str()
        .map(|o| o == "http://localhost" || o.starts_with("http://localhost:"))
        .unwrap_or(false)
}
