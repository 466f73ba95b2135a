/*
 * Responsibility
 * - compose a UserProfile from the directory account and resolved roles
 * - built fresh per request, never stored
 */
use std::{sync::Arc, time::Duration};

use crate::services::directory::{DirectoryClient, DirectoryError};
use crate::services::roles::RoleResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub given_name: String,
    pub surname: String,
    pub email: String,
    // one entry per authority, in authority order
    pub roles: Vec<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    directory: Arc<dyn DirectoryClient>,
    roles: RoleResolver,
    timeout: Duration,
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService")
            .field("roles", &self.roles)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ProfileService {
    pub fn new(directory: Arc<dyn DirectoryClient>, timeout: Duration) -> Self {
        Self {
            roles: RoleResolver::new(directory.clone(), timeout),
            directory,
            timeout,
        }
    }

    pub async fn fetch(
        &self,
        username: &str,
        authorities: &[String],
    ) -> Result<UserProfile, DirectoryError> {
        let account = tokio::time::timeout(self.timeout, self.directory.get_account(username))
            .await
            .map_err(|_| {
                DirectoryError::Unavailable(format!("account lookup timed out after {:?}", self.timeout))
            })??;

        let roles = self.roles.resolve_roles(authorities).await?;

        Ok(UserProfile {
            username: account.username,
            given_name: account.given_name,
            surname: account.surname,
            email: account.email,
            roles,
        })
    }
}
