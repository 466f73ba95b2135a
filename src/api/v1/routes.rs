/*
 * Responsibility
 * - v1 URL structure
 * - authentication is resolved by middleware; handlers demand it via CurrentPrincipal
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::users::{get_user, redirect_to_current_user};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(redirect_to_current_user))
        .route("/users/{username}", get(get_user))
}
