//! Tag and manifest deletion.
//!
//! Every DELETE goes through the same protocol: a `200` or `202` is a
//! success, a `401` on the first attempt triggers exactly one token refresh
//! and one retry, and anything else is a failure. Failures are logged and
//! counted, never raised; only transport errors propagate.
//!
//! All tags of an image are deleted, in tag-list order, before the image's
//! manifest is deleted by digest.

use crate::auth::{CredentialProvider, Credentials};
use crate::client::Client;
use crate::error::Result;
use crate::inventory::Image;
use humansize::{DECIMAL, format_size};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

/// Terminal verdict of one delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The registry confirmed the delete (or a dry run skipped it)
    Deleted,
    /// The registry refused the delete with this status
    Failed { status: StatusCode },
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// What happened to one image: tags removed and whether the manifest went too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub tags_deleted: usize,
    pub image_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retried,
}

/// Executes deletions for one run.
///
/// The deleter owns the run's current [`Credentials`]. A refresh replaces
/// them for every later request, so a token renewed while deleting one tag
/// is reused for the rest of the run.
pub struct Deleter<'a> {
    client: &'a Client,
    provider: &'a dyn CredentialProvider,
    credentials: Credentials,
    dry_run: bool,
    refreshes: usize,
}

impl<'a> Deleter<'a> {
    /// Creates a deleter starting with `credentials`.
    pub fn new(
        client: &'a Client,
        provider: &'a dyn CredentialProvider,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            provider,
            credentials,
            dry_run: false,
            refreshes: 0,
        }
    }

    /// When enabled, no DELETE is sent and every candidate counts as deleted.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The credentials the next request will carry.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Number of token refreshes performed so far.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    /// Deletes every tag of `image`, then the image itself.
    ///
    /// The manifest delete is attempted even when some tags could not be
    /// deleted; the registry decides whether it can go.
    pub async fn delete(&mut self, image: &Image) -> Result<DeletionOutcome> {
        let tags_deleted = self.delete_tags(image).await?;
        let image_deleted = self.delete_image(image).await?;

        Ok(DeletionOutcome {
            tags_deleted,
            image_deleted,
        })
    }

    /// Deletes the tags of `image` in order and returns how many went.
    pub async fn delete_tags(&mut self, image: &Image) -> Result<usize> {
        let mut deleted = 0;

        for tag in &image.tags {
            match self.delete_reference(&image.repository_url, tag).await? {
                DeleteOutcome::Deleted => {
                    info!(repository = %image.repository_url, tag = %tag, "Deleted tag");
                    deleted += 1;
                }
                DeleteOutcome::Failed { status } => {
                    warn!(
                        repository = %image.repository_url,
                        tag = %tag,
                        status = status.as_u16(),
                        "Failed to delete tag"
                    );
                }
            }
        }

        Ok(deleted)
    }

    /// Deletes the manifest of `image` by digest.
    pub async fn delete_image(&mut self, image: &Image) -> Result<bool> {
        let outcome = self
            .delete_reference(&image.repository_url, &image.digest)
            .await?;

        match outcome {
            DeleteOutcome::Deleted => {
                info!(
                    image = %image.reference(),
                    size = %format_size(image.size_bytes, DECIMAL),
                    uploaded_at = %image.uploaded_at,
                    "Deleted revision"
                );
                Ok(true)
            }
            DeleteOutcome::Failed { status } => {
                warn!(
                    image = %image.reference(),
                    status = status.as_u16(),
                    "Failed to delete revision"
                );
                Ok(false)
            }
        }
    }

    /// Deletes one tag or digest, refreshing the token at most once.
    pub async fn delete_reference(
        &mut self,
        repository_url: &str,
        reference: &str,
    ) -> Result<DeleteOutcome> {
        if self.dry_run {
            info!(repository = repository_url, reference, "Dry run, not deleting");
            return Ok(DeleteOutcome::Deleted);
        }

        let mut attempt = Attempt::First;
        loop {
            let response = self
                .client
                .delete_manifest(repository_url, reference, &self.credentials)
                .await?;

            if response.is_deleted() {
                return Ok(DeleteOutcome::Deleted);
            }

            match attempt {
                Attempt::First if response.is_unauthorized() => {
                    debug!(repository = repository_url, reference, "token rejected, refreshing");
                    self.refresh().await;
                    attempt = Attempt::Retried;
                }
                Attempt::First | Attempt::Retried => {
                    return Ok(DeleteOutcome::Failed {
                        status: response.status,
                    });
                }
            }
        }
    }

    async fn refresh(&mut self) {
        let token = self.provider.access_token().await;
        self.credentials = Credentials::from_token(token);
        self.refreshes += 1;
    }
}
