use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::services::directory::client::{Account, DirectoryClient, DirectoryError};

/// Fake directory for tests: fixed groups/accounts, call log, optional latency.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    groups: HashMap<String, String>,
    accounts: HashMap<String, Account>,
    unavailable: bool,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, identifier: &str, name: &str) -> Self {
        self.groups.insert(identifier.to_string(), name.to_string());
        self
    }

    pub fn with_account(mut self, username: &str, given_name: &str, surname: &str) -> Self {
        self.accounts.insert(
            username.to_string(),
            Account {
                href: format!("https://directory.test/accounts/{username}"),
                username: username.to_string(),
                given_name: given_name.to_string(),
                surname: surname.to_string(),
                email: format!("{username}@example.com"),
            },
        );
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn group_lookups(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self) -> Result<(), DirectoryError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable {
            return Err(DirectoryError::Unavailable("directory offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn get_group_name(&self, identifier: &str) -> Result<String, DirectoryError> {
        self.calls.lock().unwrap().push(identifier.to_string());
        self.answer().await?;
        self.groups
            .get(identifier)
            .cloned()
            .ok_or(DirectoryError::NotFound { resource: "group" })
    }

    async fn get_account(&self, username: &str) -> Result<Account, DirectoryError> {
        self.answer().await?;
        self.accounts
            .get(username)
            .cloned()
            .ok_or(DirectoryError::NotFound { resource: "account" })
    }
}
