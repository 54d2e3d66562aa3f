//! Per-repository image inventory.
//!
//! An [`Inventory`] maps each owned repository to the images found in its
//! manifest listing. It is rebuilt on every run; the registry is the only
//! source of truth.

use crate::auth::Credentials;
use crate::catalog::Repository;
use crate::client::{Client, ManifestEntry};
use crate::error::{Result, ReapError};
use chrono::{DateTime, Utc};
use tracing::debug;


/// One manifest (digest) within a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Content digest, unique within the repository
    pub digest: String,
    /// URL of the repository this image belongs to
    pub repository_url: String,
    /// Tags currently pointing at this digest
    pub tags: Vec<String>,
    /// Upload time, used to order images for retention
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub media_type: String,
    pub layer_id: String,
}

impl Image {
    /// Builds an image from one entry of a manifest listing.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a timestamp is outside the range
    /// chrono can represent.
    pub fn from_manifest(
        repository: &Repository,
        digest: impl Into<String>,
        entry: ManifestEntry,
    ) -> Result<Self> {
        let digest = digest.into();
        let uploaded_at = millis_to_datetime(entry.time_uploaded_ms, "timeUploadedMs", &digest)?;
        let created_at = millis_to_datetime(entry.time_created_ms, "timeCreatedMs", &digest)?;

        Ok(Self {
            digest,
            repository_url: repository.url().to_string(),
            tags: entry.tag,
            uploaded_at,
            created_at,
            size_bytes: entry.image_size_bytes,
            media_type: entry.media_type,
            layer_id: entry.layer_id,
        })
    }

    /// Returns `<repository>@<digest>`, the form used in log lines.
    pub fn reference(&self) -> String {
        format!("{}@{}", self.repository_url, self.digest)
    }
}

fn millis_to_datetime(millis: u64, field: &str, digest: &str) -> Result<DateTime<Utc>> {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| {
            ReapError::malformed(format!("{} of {} (out of range: {})", field, digest, millis))
        })
}

/// Images grouped by repository, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    entries: Vec<(Repository, Vec<Image>)>,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the image list of a repository.
    ///
    /// Inserting a repository twice replaces its earlier list in place.
    pub fn insert(&mut self, repository: Repository, images: Vec<Image>) {
        match self.entries.iter_mut().find(|(repo, _)| *repo == repository) {
            Some((_, existing)) => *existing = images,
            None => self.entries.push((repository, images)),
        }
    }

    /// Returns the images of the repository with this URL, if present.
    pub fn get(&self, repository_url: &str) -> Option<&[Image]> {
        self.entries
            .iter()
            .find(|(repo, _)| repo.url() == repository_url)
            .map(|(_, images)| images.as_slice())
    }

    /// Number of repositories in the inventory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of images across all repositories.
    pub fn total_images(&self) -> usize {
        self.entries.iter().map(|(_, images)| images.len()).sum()
    }

    /// Iterates over repositories and their images in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Repository, &[Image])> {
        self.entries
            .iter()
            .map(|(repo, images)| (repo, images.as_slice()))
    }

    /// Iterates mutably over every repository's image list.
    pub fn image_lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<Image>> {
        self.entries.iter_mut().map(|(_, images)| images)
    }
}

/// Fetches the manifest listing of every owned repository.
///
/// Repositories not owned by `project_id` are skipped without a request
/// and get no entry at all.
///
/// # Errors
///
/// A failed listing request or an unparseable listing aborts the build.
pub async fn build_inventory(
    client: &Client,
    repositories: &[Repository],
    project_id: Option<&str>,
    credentials: &Credentials,
) -> Result<Inventory> {
    let mut inventory = Inventory::new();

    for repository in repositories {
        if !repository.is_owned_by(project_id) {
            debug!(repository = %repository, "skipping repository outside project");
            continue;
        }

        let listing = client
            .fetch_image_listing(repository.url(), credentials)
            .await?;

        let images = listing
            .manifest
            .into_iter()
            .map(|(digest, entry)| Image::from_manifest(repository, digest, entry))
            .collect::<Result<Vec<_>>>()?;

        debug!(repository = %repository, images = images.len(), "listed images");
        inventory.insert(repository.clone(), images);
    }

    Ok(inventory)
}
