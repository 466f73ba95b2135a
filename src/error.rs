/*
 * Responsibility
 * - application-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - uniform conversion of session / directory / config errors
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::directory::DirectoryError;
use crate::services::session::SessionError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{code}: {message}")]
    Forbidden { code: &'static str, message: String },
    #[error("unknown resource: {resource}")]
    UnknownResource { resource: &'static str },
    #[error("directory unavailable")]
    DirectoryUnavailable,
    #[error("session unavailable")]
    SessionUnavailable,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".into(),
            ),
            AppError::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message),
            AppError::UnknownResource { resource } => (
                StatusCode::NOT_FOUND,
                "UNKNOWN_RESOURCE",
                format!("{resource} not found."),
            ),
            AppError::DirectoryUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DIRECTORY_UNAVAILABLE",
                "identity directory unavailable".into(),
            ),
            AppError::SessionUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SESSION_UNAVAILABLE",
                "session unavailable".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        tracing::error!(error = %e, "session store failure");
        AppError::SessionUnavailable
    }
}

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound { resource } => AppError::UnknownResource { resource },
            DirectoryError::Unavailable(reason) => {
                tracing::warn!(reason = %reason, "directory unavailable");
                AppError::DirectoryUnavailable
            }
        }
    }
}
