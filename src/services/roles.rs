/*
 * Responsibility
 * - turn a principal's authority identifiers into role names via the directory
 * - one lookup per identifier, issued concurrently, output in input order
 * - any failed lookup fails the whole resolution (no partial list, no default role)
 */
use std::{sync::Arc, time::Duration};

use futures_util::future::try_join_all;

use crate::services::directory::{DirectoryClient, DirectoryError};

#[derive(Clone)]
pub struct RoleResolver {
    directory: Arc<dyn DirectoryClient>,
    timeout: Duration,
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RoleResolver {
    pub fn new(directory: Arc<dyn DirectoryClient>, timeout: Duration) -> Self {
        Self { directory, timeout }
    }

    /// Same cardinality as `authorities`; duplicates resolve (and appear) twice.
    pub async fn resolve_roles(&self, authorities: &[String]) -> Result<Vec<String>, DirectoryError> {
        let roles = try_join_all(authorities.iter().map(|id| self.resolve_one(id))).await?;

        tracing::debug!(count = roles.len(), "resolved roles");
        Ok(roles)
    }

    async fn resolve_one(&self, identifier: &str) -> Result<String, DirectoryError> {
        match tokio::time::timeout(self.timeout, self.directory.get_group_name(identifier)).await {
            Ok(Ok(name)) => Ok(name),
            Ok(Err(err)) => {
                tracing::warn!(authority = %identifier, error = %err, "role lookup failed");
                Err(err)
            }
            Err(_) => {
                tracing::warn!(authority = %identifier, timeout_ms = self.timeout.as_millis() as u64, "role lookup timed out");
                Err(DirectoryError::Unavailable(format!(
                    "group lookup timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directory::InMemoryDirectory;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn resolver(directory: InMemoryDirectory) -> (RoleResolver, Arc<InMemoryDirectory>) {
        let directory = Arc::new(directory);
        (
            RoleResolver::new(directory.clone(), Duration::from_millis(200)),
            directory,
        )
    }

    #[tokio::test]
    async fn resolves_in_order() {
        let (resolver, _) = resolver(
            InMemoryDirectory::new()
                .with_group("grp-1", "Admin")
                .with_group("grp-2", "Editor"),
        );

        let roles = resolver.resolve_roles(&ids(&["grp-1", "grp-2"])).await.unwrap();
        assert_eq!(roles, vec!["Admin", "Editor"]);

        let roles = resolver.resolve_roles(&ids(&["grp-2", "grp-1"])).await.unwrap();
        assert_eq!(roles, vec!["Editor", "Admin"]);
    }

    #[tokio::test]
    async fn duplicates_are_kept_and_looked_up_each_time() {
        let (resolver, directory) = resolver(InMemoryDirectory::new().with_group("grp-1", "Admin"));

        let roles = resolver
            .resolve_roles(&ids(&["grp-1", "grp-1", "grp-1"]))
            .await
            .unwrap();

        assert_eq!(roles, vec!["Admin", "Admin", "Admin"]);
        assert_eq!(directory.group_lookups().len(), 3);
    }

    #[tokio::test]
    async fn no_authorities_means_no_roles() {
        let (resolver, directory) = resolver(InMemoryDirectory::new());

        assert!(resolver.resolve_roles(&[]).await.unwrap().is_empty());
        assert!(directory.group_lookups().is_empty());
    }

    #[tokio::test]
    async fn one_unknown_group_fails_everything() {
        let (resolver, _) = resolver(InMemoryDirectory::new().with_group("grp-1", "Admin"));

        let err = resolver
            .resolve_roles(&ids(&["grp-1", "grp-404"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::NotFound { resource: "group" }));
    }

    #[tokio::test]
    async fn offline_directory_is_unavailable_not_unknown() {
        let (resolver, _) = resolver(
            InMemoryDirectory::new()
                .with_group("grp-1", "Admin")
                .unavailable(),
        );

        let err = resolver.resolve_roles(&ids(&["grp-1"])).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn slow_directory_times_out() {
        let (resolver, _) = resolver(
            InMemoryDirectory::new()
                .with_group("grp-1", "Admin")
                .with_latency(Duration::from_secs(5)),
        );

        let err = resolver.resolve_roles(&ids(&["grp-1"])).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unavailable(_)));
    }
}
