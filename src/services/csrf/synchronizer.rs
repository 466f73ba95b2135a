//! Keeps one anti-forgery token per session and decides which token, if any,
//! goes back to the client on this response.
//!
//! Core-only: no axum types. The middleware in `middleware::csrf::sync`
//! feeds it the request-scope candidate and writes the resulting header.

use tracing::debug;

use crate::services::csrf::SecurityToken;
use crate::services::session::{SessionError, SessionId, SessionStore};

/// Outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synchronized {
    /// Neither request nor session carries a token.
    Inactive,
    /// The request's candidate was bound into the session.
    Bound(SecurityToken),
    /// The session already had a token; hand it back unchanged.
    Propagated(SecurityToken),
}

impl Synchronized {
    /// Token to write into the response header.
    pub fn token(&self) -> Option<&SecurityToken> {
        match self {
            Synchronized::Inactive => None,
            Synchronized::Bound(token) | Synchronized::Propagated(token) => Some(token),
        }
    }
}

/// Decide and apply the session side of token synchronization.
///
/// Performs at most one session write. A session token, once present, is
/// never replaced: when both scopes hold a token the session one wins, and a
/// bind that loses a race to a concurrent request yields the stored token.
pub async fn synchronize(
    store: &dyn SessionStore,
    session: &SessionId,
    candidate: Option<&SecurityToken>,
) -> Result<Synchronized, SessionError> {
    let existing = store.get_token(session).await?;

    let outcome = match (candidate, existing) {
        (None, None) => Synchronized::Inactive,
        (Some(candidate), None) => {
            let stored = store.bind_token_if_absent(session, candidate.clone()).await?;
            if stored == *candidate {
                debug!(session = %session, "bound csrf token to session");
                Synchronized::Bound(stored)
            } else {
                debug!(session = %session, "csrf token bound concurrently, keeping stored one");
                Synchronized::Propagated(stored)
            }
        }
        (_, Some(existing)) => Synchronized::Propagated(existing),
    };

    Ok(outcome)
}
