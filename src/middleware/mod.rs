/*
 * Responsibility
 * - middleware entry points (each module exposes `apply`)
 * - request order: http -> cors -> security headers -> session -> access -> csrf issue -> csrf sync
 */
pub mod auth;
pub mod cors;
pub mod csrf;
pub mod http;
pub mod security_headers;
pub mod session;
