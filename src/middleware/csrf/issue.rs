//! Candidate issuance and echo check, ahead of the synchronizer.
//!
//! Only authenticated requests have an anti-forgery context. For those:
//! - session has no token yet → mint a `CandidateToken` into request scope
//! - state-changing method → the configured header must carry the session
//!   token (403 otherwise), unless enforcement is switched off

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Principal;
use crate::error::AppError;
use crate::middleware::csrf::CandidateToken;
use crate::services::csrf::{CsrfPolicy, SecurityToken};
use crate::services::session::SessionId;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, issue_middleware))
}

async fn issue_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if req.extensions().get::<Principal>().is_none() {
        return Ok(next.run(req).await);
    }

    let session = req.extensions().get::<SessionId>().copied().ok_or_else(|| {
        tracing::error!("no session on request; session layer missing");
        AppError::SessionUnavailable
    })?;

    let stored = state.sessions.get_token(&session).await?;

    if state.csrf.enforce && !is_safe(req.method()) {
        check_echo(&state.csrf, req.headers(), stored.as_ref())?;
    }

    if stored.is_none() {
        let candidate = state.csrf.generate().map_err(|err| {
            tracing::error!(error = %err, "could not mint csrf token");
            AppError::Internal
        })?;
        req.extensions_mut().insert(CandidateToken(candidate));
    }

    Ok(next.run(req).await)
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn check_echo(
    policy: &CsrfPolicy,
    headers: &HeaderMap,
    stored: Option<&SecurityToken>,
) -> Result<(), AppError> {
    let Some(stored) = stored else {
        tracing::warn!("state-changing request before a csrf token was issued");
        return Err(AppError::forbidden(
            "CSRF_TOKEN_MISSING",
            "fetch a csrf token before changing state",
        ));
    };

    let echoed = headers
        .get(&policy.header_name)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if constant_time_eq(echoed, stored.value.as_bytes()) {
        Ok(())
    } else {
        tracing::warn!(header = %policy.header_name, "csrf token mismatch");
        Err(AppError::forbidden("CSRF_TOKEN_MISMATCH", "invalid csrf token"))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
