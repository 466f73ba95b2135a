//! Anti-forgery token handling, in two stages that must run in this order:
//!
//! 1. `issue`: mints a candidate token into request scope for authenticated
//!    requests whose session has none, and checks the echoed header on
//!    state-changing requests.
//! 2. `sync`: binds or propagates the token (see `services::csrf::synchronize`)
//!    and writes the response header.

pub mod issue;
pub mod sync;

use crate::services::csrf::SecurityToken;

/// Request-scope slot for a freshly minted, not yet bound token.
#[derive(Debug, Clone)]
pub struct CandidateToken(pub SecurityToken);
