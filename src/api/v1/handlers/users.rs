/*
 * Responsibility
 * - /users handlers
 * - roles come from the caller's authorities, so only the caller's own profile is served
 */
use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use url::Url;

use crate::{
    api::v1::{dto::users::UserProfileResponse, extractors::CurrentPrincipal},
    error::AppError,
    state::AppState,
};

/// GET /users/me -> 303 to the caller's canonical profile URL.
pub async fn redirect_to_current_user(
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Redirect, AppError> {
    Ok(Redirect::to(&profile_location(&principal.username)?))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(username): Path<String>,
) -> Result<Json<UserProfileResponse>, AppError> {
    if username != principal.username {
        return Err(AppError::forbidden(
            "FORBIDDEN",
            "only your own profile is available",
        ));
    }

    let profile = state
        .profiles
        .fetch(&principal.username, &principal.authorities)
        .await?;

    Ok(Json(profile.into()))
}

// Path of the profile with the username percent-encoded as one segment.
fn profile_location(username: &str) -> Result<String, AppError> {
    let mut url = Url::parse("http://localhost/api/v1/users").map_err(|_| AppError::Internal)?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal)?
        .push(username);
    Ok(url.path().to_string())
}
