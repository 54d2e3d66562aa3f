//! High-level API for the reap library.
//!
//! [`Reaper`] runs one complete retention pass: it discovers the project's
//! repositories, lists their images, keeps the newest few per repository
//! and deletes the rest, tags first.
//!
//! # Examples
//!
//! ```no_run
//! use libreap::{Reaper, StaticCredentialProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reaper = Reaper::builder()
//!         .registry("https://gcr.io/v2")
//!         .keep_count(5)
//!         .credential_provider(StaticCredentialProvider::new("token", "my-project"))
//!         .build()?;
//!
//!     let summary = reaper.run().await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

use crate::auth::{
    CredentialProvider, Credentials, MetadataCredentialProvider, StaticCredentialProvider,
};
use crate::catalog::collect_repositories;
use crate::client::{Client, ClientConfig};
use crate::config::{Config, CredentialMode};
use crate::deletion::{Deleter, DeletionOutcome};
use crate::error::{Result, ReapError};
use crate::inventory::build_inventory;
use crate::retention::RetentionPolicy;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub tags_deleted: usize,
    pub images_deleted: usize,
    /// Images seen before the retention policy was applied
    pub images_considered: usize,
}

impl RunSummary {
    /// Adds the outcome of one image to the totals.
    pub fn record(&mut self, outcome: DeletionOutcome) {
        self.tags_deleted += outcome.tags_deleted;
        if outcome.image_deleted {
            self.images_deleted += 1;
        }
    }

    /// Share of considered images that were deleted, in percent.
    ///
    /// A run that saw no images reports 0.
    pub fn percent_deleted(&self) -> f64 {
        if self.images_considered == 0 {
            return 0.0;
        }
        self.images_deleted as f64 / self.images_considered as f64 * 100.0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished managing container images. Deleted {}/{} ({:.2}%). Also deleted {} tags.",
            self.images_deleted,
            self.images_considered,
            self.percent_deleted(),
            self.tags_deleted
        )
    }
}

/// Runs retention passes against a set of registries.
///
/// A `Reaper` holds no per-run state; each call to [`Reaper::run`] fetches
/// its own credentials, so one instance can serve repeated triggers.
pub struct Reaper {
    client: Client,
    provider: Arc<dyn CredentialProvider>,
    registries: Vec<String>,
    policy: RetentionPolicy,
    dry_run: bool,
}

impl Reaper {
    /// Create a builder for advanced configuration.
    pub fn builder() -> ReaperBuilder {
        ReaperBuilder::new()
    }

    /// Builds a reaper from a loaded [`Config`].
    ///
    /// The credential provider follows `credentials.mode`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let builder = Self::builder()
            .registries(config.registries.clone())
            .retention(config.retention)
            .dry_run(config.dry_run)
            .client_config(config.client_config());

        let builder = match config.credentials.mode {
            CredentialMode::Local => {
                let provider = StaticCredentialProvider::new(
                    config.credentials.token.clone(),
                    config.credentials.project_id.clone(),
                );
                builder.credential_provider(provider)
            }
            CredentialMode::Metadata => {
                let provider = MetadataCredentialProvider::new(
                    &config.credentials.metadata_url,
                    config.network.timeout,
                )?;
                builder.credential_provider(provider)
            }
        };

        builder.build()
    }

    /// Performs one full run: collect, list, sort, trim, delete.
    ///
    /// Refused deletes only lower the counts. A failed listing request or a
    /// transport error aborts the run; deletions made before that stay done.
    pub async fn run(&self) -> Result<RunSummary> {
        let credentials = Credentials::from_token(self.provider.access_token().await);
        let project_id = self.provider.project_id().await;

        info!(
            project_id = project_id.as_deref().unwrap_or("<none>"),
            registries = self.registries.len(),
            keep_count = self.policy.keep_count,
            dry_run = self.dry_run,
            "Starting container image cleanup"
        );
        if credentials.is_anonymous() {
            warn!("no access token available, registry requests will be unauthenticated");
        }
        if project_id.is_none() {
            warn!("no project id available, no repository will be managed");
        }

        let repositories = collect_repositories(
            &self.client,
            &self.registries,
            project_id.as_deref(),
            &credentials,
        )
        .await?;

        let mut inventory = build_inventory(
            &self.client,
            &repositories,
            project_id.as_deref(),
            &credentials,
        )
        .await?;

        let images_considered = self.policy.apply(&mut inventory);
        let mut summary = RunSummary {
            images_considered,
            ..RunSummary::default()
        };

        let mut deleter = Deleter::new(&self.client, self.provider.as_ref(), credentials)
            .with_dry_run(self.dry_run);

        for (repository, images) in inventory.iter() {
            if !images.is_empty() {
                info!(repository = %repository, candidates = images.len(), "Deleting old images");
            }
            for image in images {
                let outcome = deleter.delete(image).await?;
                summary.record(outcome);
            }
        }

        info!(
            tags_deleted = summary.tags_deleted,
            images_deleted = summary.images_deleted,
            images_considered = summary.images_considered,
            token_refreshes = deleter.refreshes(),
            "{}",
            summary
        );
        Ok(summary)
    }

    /// The catalog base URLs this reaper walks.
    pub fn registries(&self) -> &[String] {
        &self.registries
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Builder for creating a [`Reaper`] with custom configuration.
///
/// Defaults: the two conventional gcr hosts, keep 5, no dry run, default
/// client settings. A credential provider is required.
pub struct ReaperBuilder {
    registries: Option<Vec<String>>,
    policy: RetentionPolicy,
    dry_run: bool,
    client_config: ClientConfig,
    provider: Option<Arc<dyn CredentialProvider>>,
}

impl ReaperBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registries: None,
            policy: RetentionPolicy::default(),
            dry_run: false,
            client_config: ClientConfig::default(),
            provider: None,
        }
    }

    /// Replace the catalog base URLs.
    pub fn registries(mut self, registries: Vec<String>) -> Self {
        self.registries = Some(registries);
        self
    }

    /// Add one catalog base URL.
    pub fn registry(mut self, url: &str) -> Self {
        self.registries
            .get_or_insert_with(Vec::new)
            .push(url.to_string());
        self
    }

    pub fn retention(mut self, policy: RetentionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Keep this many images per repository.
    pub fn keep_count(mut self, keep_count: usize) -> Self {
        self.policy = RetentionPolicy::new(keep_count);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Set the source of tokens and the project id.
    pub fn credential_provider(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Build the `Reaper` instance.
    pub fn build(self) -> Result<Reaper> {
        let provider = self
            .provider
            .ok_or_else(|| ReapError::config("a credential provider is required", None))?;

        let registries = self
            .registries
            .unwrap_or_else(|| Config::default().registries);
        if let Some(bad) = registries
            .iter()
            .find(|url| !url.starts_with("http://") && !url.starts_with("https://"))
        {
            return Err(ReapError::config(
                format!("registry URL must start with http:// or https://: {}", bad),
                None,
            ));
        }

        Ok(Reaper {
            client: Client::with_config(self.client_config)?,
            provider,
            registries,
            policy: self.policy,
            dry_run: self.dry_run,
        })
    }
}

impl Default for ReaperBuilder {
    fn default() -> Self {
        Self::new()
    }
}
