//! Credential provider backed by the instance metadata service.
//!
//! The token comes from the default service account of the instance the
//! job runs on; the project identifier is the instance's project. Every
//! request carries the `Metadata-Flavor: Google` header, without which the
//! service refuses to answer.

use super::CredentialProvider;
use crate::error::{Result, ReapError};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default base URL of the metadata service.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const PROJECT_ID_PATH: &str = "/computeMetadata/v1/project/project-id";
const TOKEN_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Fetches tokens and the project id from the metadata service.
#[derive(Debug, Clone)]
pub struct MetadataCredentialProvider {
    http_client: ReqwestClient,
    base_url: String,
}

impl MetadataCredentialProvider {
    /// Creates a provider talking to `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ReapError::transport("failed to create HTTP client", e))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    /// Returns the metadata service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_token(&self) -> Result<String> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let response = self
            .http_client
            .get(&url)
            .query(&[("scopes", TOKEN_SCOPE)])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ReapError::transport("token request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReapError::status(&url, status, &body));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ReapError::parse("token response", e))?;

        Ok(body.access_token)
    }

    async fn fetch_project_id(&self) -> Result<String> {
        let url = format!("{}{}", self.base_url, PROJECT_ID_PATH);
        let response = self
            .http_client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ReapError::transport("project id request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReapError::status(&url, status, &body));
        }

        let project_id = response
            .text()
            .await
            .map_err(|e| ReapError::transport("failed to read project id", e))?;
        let project_id = project_id.trim();

        if project_id.is_empty() {
            return Err(ReapError::malformed("project id (empty body)"));
        }

        Ok(project_id.to_string())
    }
}

#[async_trait]
impl CredentialProvider for MetadataCredentialProvider {
    async fn access_token(&self) -> Option<String> {
        match self.fetch_token().await {
            Ok(token) => {
                debug!("fetched access token from metadata service");
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "error while fetching access token");
                None
            }
        }
    }

    async fn project_id(&self) -> Option<String> {
        match self.fetch_project_id().await {
            Ok(project_id) => Some(project_id),
            Err(e) => {
                warn!(error = %e, "error while fetching project id");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
