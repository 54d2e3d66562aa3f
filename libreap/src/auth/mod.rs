//! Authentication handling for registry requests.
//!
//! This module holds the bearer [`Credentials`] attached to every registry
//! request, and the [`CredentialProvider`] seam that supplies a fresh token
//! and the owning project identifier. Two providers ship with the crate:
//! [`MetadataCredentialProvider`] asks the instance metadata service, and
//! [`StaticCredentialProvider`] returns fixed values for local runs.

mod metadata;

pub use metadata::{DEFAULT_METADATA_URL, MetadataCredentialProvider};

use async_trait::async_trait;


/// Credentials for registry authentication.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No token available; requests go out without an Authorization header
    Anonymous,

    /// Bearer token authentication (OAuth2-style)
    Bearer {
        /// The bearer token
        token: String,
    },
}

impl Credentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Bearer token credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::auth::Credentials;
    ///
    /// let creds = Credentials::bearer("token123");
    /// assert_eq!(creds.to_header_value().as_deref(), Some("Bearer token123"));
    /// ```
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Builds credentials from whatever a [`CredentialProvider`] returned.
    ///
    /// A missing or blank token becomes [`Credentials::Anonymous`].
    pub fn from_token(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => Self::bearer(token),
            _ => Self::Anonymous,
        }
    }

    /// Returns true when no token is held.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Returns the Authorization header value for these credentials.
    pub fn to_header_value(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Bearer { token } => Some(format!("Bearer {}", token)),
        }
    }
}

// Tokens end up in logs through `{:?}` on structs that hold credentials.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Bearer { .. } => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Source of the bearer token and the owning project identifier.
///
/// Both calls may be made repeatedly within one run; the deletion protocol
/// calls [`access_token`](CredentialProvider::access_token) again whenever a
/// registry answers `401`. Implementations never fail: an unreachable
/// identity service is logged and reported as `None`.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns a bearer token, or `None` if one could not be obtained.
    async fn access_token(&self) -> Option<String>;

    /// Returns the identifier of the project that owns the repositories.
    async fn project_id(&self) -> Option<String>;
}

/// Provider returning fixed values, used for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    token: Option<String>,
    project_id: Option<String>,
}

impl StaticCredentialProvider {
    /// Creates a provider that always hands out the given values.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::auth::StaticCredentialProvider;
    ///
    /// let provider = StaticCredentialProvider::new("token", "my-project");
    /// ```
    pub fn new(token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            project_id: Some(project_id.into()),
        }
    }

    /// Creates a provider from optional values.
    pub fn from_parts(token: Option<String>, project_id: Option<String>) -> Self {
        Self { token, project_id }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn project_id(&self) -> Option<String> {
        self.project_id.clone()
    }
}
