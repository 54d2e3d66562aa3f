//! Job configuration.
//!
//! This module manages configuration with sensible defaults, loading from an
//! optional YAML file and merging environment variables prefixed `REAP_`
//! (nested keys use `__`, e.g. `REAP_RETENTION__KEEP_COUNT=10`).

use crate::client::ClientConfig;
use crate::error::{Result, ReapError};
use crate::retention::RetentionPolicy;
use config::{Config as ConfigRs, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;


/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Catalog base URLs, API prefix included
    #[serde(default = "default_registries")]
    pub registries: Vec<String>,

    #[serde(default)]
    pub retention: RetentionPolicy,

    #[serde(default)]
    pub network: Network,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Report what would be deleted without deleting anything
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registries: default_registries(),
            retention: RetentionPolicy::default(),
            network: Network::default(),
            credentials: CredentialsConfig::default(),
            dry_run: false,
        }
    }
}

fn default_registries() -> Vec<String> {
    vec![
        "https://gcr.io/v2".to_string(),
        "https://eu.gcr.io/v2".to_string(),
    ]
}

impl Config {
    /// Parses a `Config` from a YAML string, on top of the defaults.
    ///
    /// This function is primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = Self::defaults_builder()?.add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder)
    }

    /// Loads a `Config` from an optional file path and the environment.
    ///
    /// Precedence, lowest first: defaults, the file, `REAP_*` variables.
    /// A path that does not exist is an error; `None` skips the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Config::load`], reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Self::defaults_builder()?;

        if let Some(p) = path {
            if !p.exists() {
                return Err(ReapError::config(
                    "configuration file not found",
                    Some(&p.display().to_string()),
                ));
            }
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("REAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("registries")
                .source(env),
        );

        Self::from_builder(builder)
    }

    /// Returns the HTTP client settings derived from this configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new().with_timeout(self.network.timeout)
    }

    fn defaults_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = ConfigRs::try_from(&Config::default())
            .map_err(|e| ReapError::config_source("failed to serialize defaults", e))?;

        Ok(ConfigRs::builder().add_source(defaults))
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config: Self = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| ReapError::config_source("invalid configuration", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Ownership is a substring test, so an empty local project id would
    /// claim every repository in the registry.
    fn validate(&self) -> Result<()> {
        if self.credentials.mode == CredentialMode::Local
            && self.credentials.project_id.trim().is_empty()
        {
            return Err(ReapError::config(
                "credentials.project_id must not be empty in local mode",
                None,
            ));
        }
        Ok(())
    }
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Request timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

/// Where tokens and the project id come from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    /// Ask the instance metadata service
    #[default]
    Metadata,

    /// Use the fixed `token` and `project_id` values
    Local,
}

/// Credential provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub mode: CredentialMode,

    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Token handed out in local mode
    #[serde(default = "default_local_token")]
    pub token: String,

    /// Project id handed out in local mode
    #[serde(default = "default_local_project_id")]
    pub project_id: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            mode: CredentialMode::default(),
            metadata_url: default_metadata_url(),
            token: default_local_token(),
            project_id: default_local_project_id(),
        }
    }
}

fn default_metadata_url() -> String {
    crate::auth::DEFAULT_METADATA_URL.to_string()
}

fn default_local_token() -> String {
    "token".to_string()
}

fn default_local_project_id() -> String {
    "local-project".to_string()
}
