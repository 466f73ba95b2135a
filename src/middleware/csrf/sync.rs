//! Token Synchronizer stage.
//!
//! Runs once per request ahead of the handlers:
//! - binds the request-scope candidate into an empty session, or keeps the
//!   session token when there already is one
//! - exposes the effective `SecurityToken` to handlers via extensions
//! - writes `<token.header_name>: <token.value>` on the response
//!
//! A request without a session is a pipeline error and fails the request.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::middleware::csrf::CandidateToken;
use crate::services::csrf::{SecurityToken, synchronize};
use crate::services::session::SessionId;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, sync_middleware))
}

async fn sync_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session = req.extensions().get::<SessionId>().copied().ok_or_else(|| {
        tracing::error!("no session on request; session layer missing");
        AppError::SessionUnavailable
    })?;
    let candidate = req.extensions().get::<CandidateToken>().cloned();

    let outcome = synchronize(
        state.sessions.as_ref(),
        &session,
        candidate.as_ref().map(|c| &c.0),
    )
    .await?;

    let propagate = match outcome.token() {
        Some(token) => {
            let header = propagation_header(token)?;
            req.extensions_mut().insert(token.clone());
            Some(header)
        }
        None => None,
    };

    let mut res = next.run(req).await;

    if let Some((name, value)) = propagate {
        res.headers_mut().insert(name, value);
    }

    Ok(res)
}

fn propagation_header(token: &SecurityToken) -> Result<(HeaderName, HeaderValue), AppError> {
    let name = HeaderName::from_bytes(token.header_name.as_bytes()).map_err(|err| {
        tracing::error!(error = ?err, header = %token.header_name, "invalid csrf header name");
        AppError::Internal
    })?;
    let value = HeaderValue::from_str(&token.value).map_err(|err| {
        tracing::error!(error = ?err, "csrf token is not a valid header value");
        AppError::Internal
    })?;
    Ok((name, value))
}
