use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Account record as the directory returns it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub href: String,
    pub username: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
}

/// `NotFound` means the directory answered and has no such resource;
/// `Unavailable` covers everything where no answer was obtained.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Display name of the group an authority identifier references.
    async fn get_group_name(&self, identifier: &str) -> Result<String, DirectoryError>;

    async fn get_account(&self, username: &str) -> Result<Account, DirectoryError>;
}
