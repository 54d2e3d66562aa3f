//! Repository discovery.
//!
//! Lists every repository under a set of catalog base URLs and keeps those
//! owned by the current project. Ownership is a plain substring test on the
//! repository URL, so a project id that is a prefix of another project's id
//! also claims that project's repositories.

use crate::auth::Credentials;
use crate::client::Client;
use crate::error::Result;
use std::fmt;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// A fully-qualified repository path, e.g. `https://gcr.io/v2/proj/app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Repository {
    url: String,
}

impl Repository {
    /// Builds the repository URL for `name` under a catalog base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::catalog::Repository;
    ///
    /// let repo = Repository::from_catalog("https://gcr.io/v2", "proj/app/api");
    /// assert_eq!(repo.url(), "https://gcr.io/v2/proj/app/api");
    /// ```
    pub fn from_catalog(base_url: &str, name: &str) -> Self {
        Self {
            url: format!("{}/{}", base_url, name),
        }
    }

    /// Wraps an already fully-qualified repository URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Returns the repository URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true if this repository belongs to `project_id`.
    ///
    /// An absent project id owns nothing. An empty one is a substring of
    /// every URL and owns everything; local configuration refuses it.
    pub fn is_owned_by(&self, project_id: Option<&str>) -> bool {
        project_id.is_some_and(|id| self.url.contains(id))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Lists the repositories under every base URL that belong to `project_id`.
///
/// Results keep catalog order, base URL by base URL.
///
/// # Errors
///
/// Any failed catalog request aborts the collection.
pub async fn collect_repositories(
    client: &Client,
    base_urls: &[String],
    project_id: Option<&str>,
    credentials: &Credentials,
) -> Result<Vec<Repository>> {
    let mut repositories = Vec::new();

    for base_url in base_urls {
        let base_url = base_url.trim_end_matches('/');
        let names = client.fetch_catalog(base_url, credentials).await?;
        let listed = names.len();

        let owned: Vec<Repository> = names
            .iter()
            .map(|name| Repository::from_catalog(base_url, name))
            .filter(|repo| repo.is_owned_by(project_id))
            .collect();

        debug!(base_url, listed, owned = owned.len(), "catalog listed");
        repositories.extend(owned);
    }

    info!(count = repositories.len(), "collected repositories");
    Ok(repositories)
}
