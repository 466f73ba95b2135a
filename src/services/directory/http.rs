//! REST client for the identity directory.
//!
//! Authority identifiers are usually the full `href` of a group resource.
//! Those are fetched as-is (same origin as the configured base only); any
//! other identifier, colons included, resolves to `{base}/groups/{id}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::services::directory::client::{Account, DirectoryClient, DirectoryError};

#[derive(Debug, Deserialize)]
struct GroupResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AccountList {
    #[serde(default)]
    items: Vec<Account>,
}

#[derive(Clone)]
pub struct HttpDirectoryClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl std::fmt::Debug for HttpDirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the API key secret
        f.debug_struct("HttpDirectoryClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl HttpDirectoryClient {
    pub fn new(
        base_url: Url,
        credentials: Option<(String, String)>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::Unavailable("directory base url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn group_url(&self, identifier: &str) -> Result<Url, DirectoryError> {
        match Url::parse(identifier) {
            Ok(href) if matches!(href.scheme(), "http" | "https") => {
                // Never send directory credentials to another host.
                if href.origin() == self.base_url.origin() {
                    Ok(href)
                } else {
                    Err(DirectoryError::NotFound { resource: "group" })
                }
            }
            // `grp:admin`, `urn:x:1` and the like are ids, not links.
            _ => self.endpoint(&["groups", identifier]),
        }
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(
        &self,
        url: Url,
        resource: &'static str,
    ) -> Result<T, DirectoryError> {
        debug!(url = %url, resource, "directory lookup");

        let mut request = self.http.get(url);
        if let Some((id, secret)) = &self.credentials {
            request = request.basic_auth(id, Some(secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        classify(response.status(), resource)?;

        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("invalid {resource} payload: {e}")))
    }
}

fn classify(status: StatusCode, resource: &'static str) -> Result<(), DirectoryError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND {
        Err(DirectoryError::NotFound { resource })
    } else {
        // 401/403 are access failures on our side, 5xx on theirs; neither is "no such group".
        Err(DirectoryError::Unavailable(format!(
            "directory answered {status} for {resource}"
        )))
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn get_group_name(&self, identifier: &str) -> Result<String, DirectoryError> {
        let url = self.group_url(identifier)?;
        let group: GroupResource = self.fetch(url, "group").await?;
        Ok(group.name)
    }

    async fn get_account(&self, username: &str) -> Result<Account, DirectoryError> {
        let mut url = self.endpoint(&["accounts"])?;
        url.query_pairs_mut().append_pair("username", username);

        let list: AccountList = self.fetch(url, "account").await?;
        list.items
            .into_iter()
            .find(|a| a.username == username)
            .ok_or(DirectoryError::NotFound { resource: "account" })
    }
}
