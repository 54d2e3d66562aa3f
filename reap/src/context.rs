//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables (`REAP_*`)
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use libreap::{Config, RetentionPolicy};
use std::path::{Path, PathBuf};

/// Log verbosity selected with repeated `-v` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Warn,
    Info,
    Debug,
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// `EnvFilter` directive for our own crates; dependencies stay at `warn`.
    pub fn filter_directive(&self) -> String {
        let level = match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        format!("warn,reap={0},libreap={0}", level)
    }
}

/// Flags from `reap run` that override loaded configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub dry_run: bool,
    pub keep: Option<usize>,
}

/// Application context with resolved configuration
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// File the configuration was read from, if any
    pub config_path: Option<PathBuf>,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    ///
    /// `cli_config` is the `--config` value (clap also fills it from
    /// `REAP_CONFIG`). An explicit path must exist; the default location is
    /// used only when present.
    pub fn build(cli_config: Option<&Path>) -> Result<Self, String> {
        let config_path = resolve_config_path(cli_config);
        let config = Config::load(config_path.as_deref()).map_err(|e| match &config_path {
            Some(path) => format!("{} ({})", e, path.display()),
            None => e.to_string(),
        })?;

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Apply `reap run` flags on top of the loaded configuration.
    pub fn with_overrides(mut self, overrides: RunOverrides) -> Self {
        if overrides.dry_run {
            self.config.dry_run = true;
        }
        if let Some(keep) = overrides.keep {
            self.config.retention = RetentionPolicy::new(keep);
        }
        self
    }
}

/// Pick the configuration file: the explicit path, else
/// `<config dir>/reap/config.yaml` when it exists.
pub fn resolve_config_path(cli_config: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_config {
        return Some(path.to_path_buf());
    }

    dirs::config_dir()
        .map(|dir| dir.join("reap").join("config.yaml"))
        .filter(|path| path.exists())
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
