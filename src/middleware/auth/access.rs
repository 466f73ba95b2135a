//! Access token verification → `Principal` in request extensions.
//!
//! - No `Authorization` header: anonymous request, passes through.
//! - `Authorization: Bearer <jwt>` that verifies: principal attached.
//! - Anything else: 401. Handlers that need a caller use `CurrentPrincipal`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::Principal;
use crate::error::AppError;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = auth
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let verified = match state.auth.verify(token) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(error = %err, "access token verification failed");
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(
        username = %verified.username,
        jti = ?verified.jti,
        authorities = verified.authorities.len(),
        "authenticated"
    );

    req.extensions_mut()
        .insert(Principal::new(verified.username, verified.authorities));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;
    use crate::api::v1::extractors::CurrentPrincipal;
    use crate::services::auth::test_keys::{claims, sign};
    use crate::services::directory::InMemoryDirectory;
    use crate::state::test_support;

    fn router() -> Router {
        let state = test_support::state(InMemoryDirectory::new());
        let router = Router::new()
            .route(
                "/me",
                get(|CurrentPrincipal(p): CurrentPrincipal| async move {
                    format!("{}:{}", p.username, p.authorities.join(","))
                }),
            )
            .route("/open", get(|| async { "open" }));
        apply(router, state.clone()).with_state(state)
    }

    fn get_with(uri: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn verified_token_yields_principal() {
        let token = sign(&claims("ann", &["grp-1", "grp-2"]));
        let res = router()
            .oneshot(get_with("/me", Some(&format!("Bearer {token}"))))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ann:grp-1,grp-2");
    }

    #[tokio::test]
    async fn anonymous_requests_pass_but_cannot_extract_a_principal() {
        let res = router().oneshot(get_with("/open", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = router().oneshot(get_with("/me", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected_everywhere() {
        for value in ["Basic YW5uOnB3", "Bearer ", "Bearer not-a-jwt"] {
            let res = router().oneshot(get_with("/open", Some(value))).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{value}");
        }
    }
}
