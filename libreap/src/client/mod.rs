//! HTTP client for registry communication.
//!
//! This module provides a thin HTTP client built on reqwest. The core call,
//! [`Client::request`], sends one request with the current bearer token and
//! hands back the status code and body without interpreting them; the
//! deletion protocol decides what a status means. The listing helpers on
//! top of it do classify failures, since a listing that fails cannot be
//! recovered from.

use crate::auth::Credentials;
use crate::error::{Result, ReapError};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use std::time::Duration;
use tracing::debug;

mod listing;

pub(crate) use listing::CatalogResponse;
pub use listing::{ImageListing, ManifestEntry};


/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libreap::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_max_idle_per_host(20);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

/// Status and body of a registry response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    /// HTTP status returned by the registry
    pub status: StatusCode,
    /// Raw response body
    pub body: String,
}

impl RegistryResponse {
    /// Returns true for the statuses a registry uses to confirm a delete.
    pub fn is_deleted(&self) -> bool {
        self.status == StatusCode::OK || self.status == StatusCode::ACCEPTED
    }

    /// Returns true when the registry rejected the token.
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }
}

/// HTTP client for registry operations.
///
/// Unlike a client bound to a single registry, every call takes a
/// fully-qualified URL: one run spans several registry hosts.
#[derive(Debug, Clone)]
pub struct Client {
    /// The underlying HTTP client
    http_client: ReqwestClient,
    /// Configured request timeout, kept for error messages
    timeout_seconds: u64,
}

impl Client {
    /// Creates a new client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::client::{Client, ClientConfig};
    ///
    /// let client = Client::with_config(ClientConfig::new().with_timeout(10)).unwrap();
    /// ```
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| ReapError::transport("failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Sends one request and returns its status and body.
    ///
    /// The Authorization header is attached whenever `credentials` hold a
    /// token. No retry happens here and the status is not inspected.
    ///
    /// # Errors
    ///
    /// Returns [`ReapError::Transport`] only when no response was received
    /// (connection refused, timeout, unreadable body).
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        credentials: &Credentials,
    ) -> Result<RegistryResponse> {
        debug!(%method, url, "registry request");

        let mut request = self.http_client.request(method, url);
        if let Some(auth_header) = credentials.to_header_value() {
            request = request.header(reqwest::header::AUTHORIZATION, auth_header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.translate_reqwest_error(e, url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReapError::transport(format!("failed to read response from {}", url), e))?;

        Ok(RegistryResponse { status, body })
    }

    /// Fetches the repository names listed under a catalog base URL.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Registry base URL including the API prefix (e.g. `https://gcr.io/v2`)
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is unreachable, answers with a
    /// non-2xx status, or sends a body that is not a catalog.
    pub async fn fetch_catalog(
        &self,
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<Vec<String>> {
        let url = format!("{}/_catalog", base_url);
        let response = self.request(Method::GET, &url, credentials).await?;
        let response = Self::require_success(response, &url)?;

        let catalog: CatalogResponse = serde_json::from_str(&response.body)
            .map_err(|e| ReapError::parse(format!("catalog from {}", url), e))?;

        Ok(catalog.repositories)
    }

    /// Fetches the manifest listing of one repository.
    ///
    /// # Arguments
    ///
    /// * `repository_url` - Fully-qualified repository URL (e.g. `https://gcr.io/v2/proj/app`)
    pub async fn fetch_image_listing(
        &self,
        repository_url: &str,
        credentials: &Credentials,
    ) -> Result<ImageListing> {
        let url = format!("{}/tags/list", repository_url);
        let response = self.request(Method::GET, &url, credentials).await?;
        let response = Self::require_success(response, &url)?;

        serde_json::from_str(&response.body)
            .map_err(|e| ReapError::parse(format!("image listing from {}", url), e))
    }

    /// Issues `DELETE <repository_url>/manifests/<reference>`.
    ///
    /// `reference` is either a tag or a digest. The raw response is returned
    /// so the caller can apply its own retry policy.
    pub async fn delete_manifest(
        &self,
        repository_url: &str,
        reference: &str,
        credentials: &Credentials,
    ) -> Result<RegistryResponse> {
        let url = format!("{}/manifests/{}", repository_url, reference);
        self.request(Method::DELETE, &url, credentials).await
    }

    fn translate_reqwest_error(&self, error: reqwest::Error, url: &str) -> ReapError {
        if error.is_timeout() {
            ReapError::timeout(url, self.timeout_seconds)
        } else if error.is_connect() {
            ReapError::transport(format!("failed to connect to {}", url), error)
        } else {
            ReapError::transport(format!("request to {} failed", url), error)
        }
    }

    /// Listings cannot be retried or skipped: any non-2xx aborts the run.
    fn require_success(response: RegistryResponse, url: &str) -> Result<RegistryResponse> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(ReapError::status(url, response.status, &response.body))
        }
    }
}
