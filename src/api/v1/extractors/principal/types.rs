/*
 * Responsibility
 * - the authenticated caller as handlers see it
 * - filled in by middleware::auth::access from a verified access token
 */

/// Authenticated caller.
///
/// - `username` is the token subject and the directory account name
/// - `authorities` are opaque directory group references, in token order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            username: username.into(),
            authorities,
        }
    }
}
