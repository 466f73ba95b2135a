//! Key/value cache interface backing the session attribute store.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command).
///
/// Kept independent from `SessionError` so the session store decides how a
/// backend failure surfaces.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// String-based cache with the two operations session attributes need:
/// a plain read and an atomic "set if absent" with expiry.
///
/// Implementations must be cheap to clone.
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    fn backend_name(&self) -> &'static str;

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Returns `Ok(true)` when the key was written, `Ok(false)` when it already existed.
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool>;
}
