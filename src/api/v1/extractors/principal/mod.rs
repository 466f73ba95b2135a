/*!
 * Authenticated principal extractor
 *
 * Responsibility:
 * - hand handlers the principal the access middleware verified
 * - axum-specific code lives in core, the type in types
 */

mod core;
mod types;

pub use core::CurrentPrincipal;
pub use types::Principal;
