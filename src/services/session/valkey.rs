use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::services::cache::{CacheClient, CacheError, ValkeyClient};
use crate::services::csrf::SecurityToken;
use crate::services::session::store::{CSRF_TOKEN_KEY, SessionError, SessionId, SessionStore};

// A bind can race with key expiry between `SET NX` and `GET`.
const BIND_ATTEMPTS: usize = 2;

/// Valkey-backed session attribute store.
///
/// Keys are `{prefix}:{session}:csrfToken` holding the token as JSON, written
/// with `SET NX EX` so that the first bind for a session is the only one.
#[derive(Clone)]
pub struct ValkeySessionStore<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
    ttl: Duration,
}

impl ValkeySessionStore<ValkeyClient> {
    pub async fn connect(redis_url: &str, ttl: Duration) -> Result<Self, SessionError> {
        let client = ValkeyClient::new(redis_url).await?;
        Ok(Self::new_with_cache(Arc::new(client), "session", ttl))
    }
}

impl<C: CacheClient> ValkeySessionStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl,
        }
    }

    fn key(&self, session: &SessionId) -> String {
        format!("{}:{}:{}", self.prefix, session, CSRF_TOKEN_KEY)
    }

    fn decode(raw: &str) -> Result<SecurityToken, SessionError> {
        serde_json::from_str(raw).map_err(|e| SessionError::Corrupt {
            key: CSRF_TOKEN_KEY,
            reason: e.to_string(),
        })
    }
}

impl From<CacheError> for SessionError {
    fn from(e: CacheError) -> Self {
        SessionError::Backend(e.to_string())
    }
}

#[async_trait]
impl<C: CacheClient> SessionStore for ValkeySessionStore<C> {
    fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    async fn get_token(&self, session: &SessionId) -> Result<Option<SecurityToken>, SessionError> {
        match self.cache.get_string(&self.key(session)).await? {
            Some(raw) => Self::decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn bind_token_if_absent(
        &self,
        session: &SessionId,
        token: SecurityToken,
    ) -> Result<SecurityToken, SessionError> {
        let key = self.key(session);
        let encoded = serde_json::to_string(&token).map_err(|e| SessionError::Corrupt {
            key: CSRF_TOKEN_KEY,
            reason: e.to_string(),
        })?;

        for _ in 0..BIND_ATTEMPTS {
            if self
                .cache
                .set_if_absent_with_ttl(&key, &encoded, self.ttl)
                .await?
            {
                return Ok(token);
            }
            if let Some(raw) = self.cache.get_string(&key).await? {
                return Self::decode(&raw);
            }
        }

        Err(SessionError::Backend(format!(
            "could not bind {CSRF_TOKEN_KEY} for session {session}"
        )))
    }
}
