/*
 * Responsibility
 * - domain services: session-bound CSRF tokens, directory access, roles, profiles
 * - nothing here knows about axum routing
 */
pub mod auth;
pub mod cache;
pub mod csrf;
pub mod directory;
pub mod profile;
pub mod roles;
pub mod session;
