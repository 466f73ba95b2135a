/*
 * Responsibility
 * - load settings from the environment (directory, access token, CSRF, session)
 * - validate them (startup fails when something required is missing)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub access_token_leeway_seconds: u64,
    pub access_jwt_public_key_pem: String,

    pub directory_base_url: Url,
    pub directory_api_key_id: Option<String>,
    pub directory_api_key_secret: Option<String>,
    pub directory_timeout: Duration,

    pub csrf_header_name: HeaderName,
    pub csrf_enforce: bool,

    pub session_cookie_name: String,
    pub session_ttl_seconds: u64,
    // None -> in-process session store
    pub valkey_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let auth_issuer =
            std::env::var("AUTH_ISSUER").map_err(|_| ConfigError::Missing("AUTH_ISSUER"))?;

        let auth_audience =
            std::env::var("AUTH_AUDIENCE").map_err(|_| ConfigError::Missing("AUTH_AUDIENCE"))?;

        let access_token_leeway_seconds = std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let access_jwt_public_key_pem = std::env::var("ACCESS_JWT_PUBLIC_KEY_PEM")
            .map_err(|_| ConfigError::Missing("ACCESS_JWT_PUBLIC_KEY_PEM"))?
            .replace("\\n", "\n");

        let directory_base_url = std::env::var("DIRECTORY_BASE_URL")
            .map_err(|_| ConfigError::Missing("DIRECTORY_BASE_URL"))?;
        let directory_base_url =
            Url::parse(&directory_base_url).map_err(|_| ConfigError::Invalid("DIRECTORY_BASE_URL"))?;

        let directory_api_key_id = non_empty_var("DIRECTORY_API_KEY_ID");
        let directory_api_key_secret = non_empty_var("DIRECTORY_API_KEY_SECRET");

        let directory_timeout = Duration::from_millis(positive(
            "DIRECTORY_TIMEOUT_MS",
            std::env::var("DIRECTORY_TIMEOUT_MS").ok().as_deref(),
            3000,
        )?);

        let csrf_header_name = std::env::var("CSRF_HEADER_NAME")
            .unwrap_or_else(|_| "X-CSRF-TOKEN".to_string());
        let csrf_header_name = HeaderName::from_str(&csrf_header_name)
            .map_err(|_| ConfigError::Invalid("CSRF_HEADER_NAME"))?;

        let csrf_enforce = match std::env::var("CSRF_ENFORCE") {
            Ok(v) => parse_flag(&v).ok_or(ConfigError::Invalid("CSRF_ENFORCE"))?,
            Err(_) => true,
        };

        let session_cookie_name =
            std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "SESSION".to_string());
        if session_cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid("SESSION_COOKIE_NAME"));
        }

        let session_ttl_seconds = positive(
            "SESSION_TTL_SECONDS",
            std::env::var("SESSION_TTL_SECONDS").ok().as_deref(),
            1800,
        )?;

        let valkey_url = non_empty_var("VALKEY_URL");

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_jwt_public_key_pem,
            directory_base_url,
            directory_api_key_id,
            directory_api_key_secret,
            directory_timeout,
            csrf_header_name,
            csrf_enforce,
            session_cookie_name,
            session_ttl_seconds,
            valkey_url,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Unset -> default; set -> must be a non-zero integer.
fn positive(key: &'static str, raw: Option<&str>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => match v.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
