use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::services::csrf::SecurityToken;

/// Session attribute key under which the anti-forgery token is bound.
pub const CSRF_TOKEN_KEY: &str = "csrfToken";

/// Identifier carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a cookie value. Anything that is not a UUID is treated as no session.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session backend error: {0}")]
    Backend(String),
    #[error("corrupt session attribute {key}: {reason}")]
    Corrupt { key: &'static str, reason: String },
}

/// Session-scoped attribute storage for the anti-forgery token.
///
/// `bind_token_if_absent` is a compare-and-set: the first token written for
/// a session wins and every later caller gets that stored token back.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn get_token(&self, session: &SessionId) -> Result<Option<SecurityToken>, SessionError>;

    async fn bind_token_if_absent(
        &self,
        session: &SessionId,
        token: SecurityToken,
    ) -> Result<SecurityToken, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::SessionId;

    #[test]
    fn cookie_values_must_be_uuids() {
        let id = SessionId::generate();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
        assert_eq!(SessionId::parse("not-a-session"), None);
    }
}
