/*
 * Responsibility
 * - shared context attached to the Router (AppState)
 *   - session store, CSRF policy, access-token verifier, profile service
 * - cheap to Clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::{
    auth::AuthService, csrf::CsrfPolicy, profile::ProfileService, session::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub session_cookie: SessionCookie,
    pub csrf: CsrfPolicy,
    pub auth: Arc<AuthService>,
    pub profiles: ProfileService,
}

/// How the session id travels in cookies.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions.backend_name())
            .field("session_cookie", &self.session_cookie)
            .field("csrf", &self.csrf)
            .field("auth", &self.auth)
            .field("profiles", &self.profiles)
            .finish()
    }
}

impl AppState {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        session_cookie: SessionCookie,
        csrf: CsrfPolicy,
        auth: Arc<AuthService>,
        profiles: ProfileService,
    ) -> Self {
        Self {
            sessions,
            session_cookie,
            csrf,
            auth,
            profiles,
        }
    }
}
