pub mod access_jwt;
pub mod factory;
#[cfg(test)]
pub mod test_keys;

pub use access_jwt::{AccessJwtError, AuthService};
pub use factory::build_auth_service;
