/*
 * Responsibility
 * - load Config -> build services -> assemble Router
 * - apply middleware (session / access / csrf, then security headers / CORS / http)
 * - start axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::{
    auth::build_auth_service,
    csrf::CsrfPolicy,
    directory::HttpDirectoryClient,
    profile::ProfileService,
    session::{MemorySessionStore, SessionStore, ValkeySessionStore},
};
use crate::state::{AppState, SessionCookie};

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,dashboard_server=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash so it gets noticed. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting dashboard server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = apply_http_layers(build_router(state), &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let sessions: Arc<dyn SessionStore> = match &config.valkey_url {
        Some(url) => Arc::new(
            ValkeySessionStore::connect(
                url,
                std::time::Duration::from_secs(config.session_ttl_seconds),
            )
            .await
            .context("connecting session store")?,
        ),
        None => {
            tracing::warn!("VALKEY_URL not set, sessions are kept in memory");
            Arc::new(MemorySessionStore::new())
        }
    };
    tracing::info!(backend = sessions.backend_name(), "session store ready");

    let credentials = config
        .directory_api_key_id
        .clone()
        .zip(config.directory_api_key_secret.clone());
    let directory = HttpDirectoryClient::new(
        config.directory_base_url.clone(),
        credentials,
        config.directory_timeout,
    )
    .context("building directory client")?;

    let auth = build_auth_service(config).context("loading access token key")?;

    Ok(AppState::new(
        sessions,
        SessionCookie {
            name: config.session_cookie_name.clone(),
            secure: config.app_env.is_production(),
        },
        CsrfPolicy::new(config.csrf_header_name.clone(), config.csrf_enforce),
        auth,
        ProfileService::new(Arc::new(directory), config.directory_timeout),
    ))
}

/// Routes plus the request-scoped security pipeline.
fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes());

    // Each `apply` wraps the previous ones, so requests pass through them
    // bottom-up: session -> access -> csrf issue -> csrf sync -> handler.
    let router = middleware::csrf::sync::apply(router, state.clone());
    let router = middleware::csrf::issue::apply(router, state.clone());
    let router = middleware::auth::access::apply(router, state.clone());
    let router = middleware::session::apply(router, state.clone());

    router.with_state(state)
}

fn apply_http_layers(router: Router, config: &Config) -> Router {
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::test_keys::{claims, sign};
    use crate::services::directory::InMemoryDirectory;
    use crate::services::session::SessionId;
    use crate::state::test_support;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_account("ann", "Ann", "Lee")
            .with_group("grp-1", "Admin")
            .with_group("grp-2", "Editor")
    }

    fn bearer(sub: &str, authorities: &[&str]) -> String {
        format!("Bearer {}", sign(&claims(sub, authorities)))
    }

    fn session_cookie(res: &Response) -> String {
        res.headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    async fn json(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn anonymous_health_check_gets_a_session_but_no_token() {
        let app = build_router(test_support::state(directory()));

        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(header::SET_COOKIE).is_some());
        assert!(res.headers().get("x-csrf-token").is_none());
    }

    #[tokio::test]
    async fn profile_fetch_returns_roles_and_binds_a_token() {
        let sessions = Arc::new(crate::services::session::MemorySessionStore::new());
        let app = build_router(test_support::state_with(directory(), sessions.clone()));

        let res = app
            .oneshot(
                Request::get("/api/v1/users/ann")
                    .header(header::AUTHORIZATION, bearer("ann", &["grp-1", "grp-2"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res);
        let token = res
            .headers()
            .get("x-csrf-token")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let body = json(res).await;
        assert_eq!(body["username"], "ann");
        assert_eq!(body["firstName"], "Ann");
        assert_eq!(body["roles"], serde_json::json!(["Admin", "Editor"]));

        let session = SessionId::parse(cookie.trim_start_matches("SESSION=")).unwrap();
        let stored = sessions.get_token(&session).await.unwrap().unwrap();
        assert_eq!(stored.value, token);
    }

    #[tokio::test]
    async fn later_requests_in_the_session_reuse_the_token() {
        let app = build_router(test_support::state(directory()));
        let auth = bearer("ann", &["grp-1"]);

        let first = app
            .clone()
            .oneshot(
                Request::get("/api/v1/users/ann")
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let cookie = session_cookie(&first);
        let token = first.headers().get("x-csrf-token").unwrap().clone();

        // authenticated again, then anonymous within the same session
        for authorization in [Some(auth.as_str()), None] {
            let mut req = Request::get("/health").header(header::COOKIE, &cookie);
            if let Some(value) = authorization {
                req = req.header(header::AUTHORIZATION, value);
            }
            let res = app
                .clone()
                .oneshot(req.body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(res.headers().get("x-csrf-token"), Some(&token));
            assert!(res.headers().get(header::SET_COOKIE).is_none());
        }
    }

    #[tokio::test]
    async fn cookie_for_an_empty_session_gets_a_fresh_token() {
        // e.g. the store entry expired, or the id was never issued here
        let sessions = Arc::new(crate::services::session::MemorySessionStore::new());
        let app = build_router(test_support::state_with(directory(), sessions.clone()));
        let session = SessionId::generate();

        let res = app
            .oneshot(
                Request::get("/health")
                    .header(header::COOKIE, format!("SESSION={session}"))
                    .header(header::AUTHORIZATION, bearer("ann", &[]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let token = res.headers().get("x-csrf-token").unwrap().to_str().unwrap();
        let stored = sessions.get_token(&session).await.unwrap().unwrap();
        assert_eq!(stored.value, token);
        assert_eq!(token.len(), 43);
    }

    #[tokio::test]
    async fn me_redirects_to_the_callers_profile() {
        let app = build_router(test_support::state(directory()));

        let res = app
            .oneshot(
                Request::get("/api/v1/users/me")
                    .header(header::AUTHORIZATION, bearer("ann", &[]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/api/v1/users/ann");
        // the redirect already carries the token
        assert!(res.headers().get("x-csrf-token").is_some());
    }

    #[tokio::test]
    async fn profiles_need_a_principal_and_are_private() {
        let app = build_router(test_support::state(directory()));

        let res = app
            .clone()
            .oneshot(Request::get("/api/v1/users/ann").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .oneshot(
                Request::get("/api/v1/users/bob")
                    .header(header::AUTHORIZATION, bearer("ann", &[]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_authority_fails_the_profile() {
        let app = build_router(test_support::state(directory()));

        let res = app
            .oneshot(
                Request::get("/api/v1/users/ann")
                    .header(header::AUTHORIZATION, bearer("ann", &["grp-1", "grp-x"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(res).await["error"]["code"], "UNKNOWN_RESOURCE");
    }

    #[tokio::test]
    async fn directory_outage_is_reported_as_unavailable() {
        let app = build_router(test_support::state(directory().unavailable()));

        let res = app
            .oneshot(
                Request::get("/api/v1/users/ann")
                    .header(header::AUTHORIZATION, bearer("ann", &["grp-1"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json(res).await["error"]["code"], "DIRECTORY_UNAVAILABLE");
    }
}
