//! Session cookie → `SessionId` in request extensions.
//!
//! Every request gets a session: a valid cookie is reused, otherwise a new
//! id is minted and sent back in `Set-Cookie`. Attributes for the id live in
//! the `SessionStore`; this layer only resolves which session a request
//! belongs to.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::services::session::SessionId;
use crate::state::{AppState, SessionCookie};

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, session_middleware))
}

async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let cookie = &state.session_cookie;

    let existing = parse_cookie(req.headers(), &cookie.name).and_then(|v| SessionId::parse(&v));
    let (session, created) = match existing {
        Some(id) => (id, false),
        None => (SessionId::generate(), true),
    };

    req.extensions_mut().insert(session);
    let mut res = next.run(req).await;

    if created {
        match HeaderValue::from_str(&set_cookie_value(cookie, &session)) {
            Ok(value) => {
                tracing::debug!(session = %session, "started session");
                res.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::error!(error = ?err, "unencodable session cookie"),
        }
    }

    res
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

fn set_cookie_value(cookie: &SessionCookie, session: &SessionId) -> String {
    let mut value = format!("{}={}; HttpOnly; SameSite=Strict; Path=/", cookie.name, session);
    if cookie.secure {
        value.push_str("; Secure");
    }
    value
}
