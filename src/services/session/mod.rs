pub mod memory;
pub mod store;
pub mod valkey;

pub use memory::MemorySessionStore;
pub use store::{SessionError, SessionId, SessionStore};
pub use valkey::ValkeySessionStore;
