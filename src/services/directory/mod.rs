/*
 * Responsibility
 * - access to the external identity directory (accounts, groups)
 * - callers only see the DirectoryClient trait
 */
pub mod client;
pub mod http;
#[cfg(test)]
pub mod memory;

pub use client::{DirectoryClient, DirectoryError};
pub use http::HttpDirectoryClient;
#[cfg(test)]
pub use memory::InMemoryDirectory;
