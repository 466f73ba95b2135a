use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::services::csrf::SecurityToken;
use crate::services::session::store::{SessionError, SessionId, SessionStore};

/// In-process session store for development and tests.
///
/// Entries live as long as the process; there is no expiry.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tokens: RwLock<HashMap<SessionId, SecurityToken>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_token(&self, session: &SessionId) -> Result<Option<SecurityToken>, SessionError> {
        Ok(self.tokens.read().await.get(session).cloned())
    }

    async fn bind_token_if_absent(
        &self,
        session: &SessionId,
        token: SecurityToken,
    ) -> Result<SecurityToken, SessionError> {
        // check and insert under one write guard
        let mut tokens = self.tokens.write().await;
        Ok(tokens.entry(*session).or_insert(token).clone())
    }
}
