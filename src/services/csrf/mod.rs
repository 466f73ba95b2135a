pub mod synchronizer;
pub mod token;

pub use synchronizer::synchronize;
pub use token::{CsrfPolicy, SecurityToken};
