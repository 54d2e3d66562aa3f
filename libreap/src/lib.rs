//! Reap - Container Image Retention Library
//!
//! Reap prunes old images from the container registries of a cloud
//! project. For every repository the project owns it keeps the most
//! recently uploaded images and deletes the rest, removing each image's
//! tags before the image itself.
//!
//! # Quick Start
//!
//! ```no_run
//! use libreap::{Config, Reaper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Defaults, then an optional YAML file, then REAP_* variables
//!     let config = Config::load(None)?;
//!
//!     let reaper = Reaper::from_config(&config)?;
//!     let summary = reaper.run().await?;
//!     println!("{}", summary);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Simple API**: one [`Reaper::run`] call per retention pass
//! - **Pluggable credentials**: instance metadata service or fixed local values
//! - **Token refresh**: a rejected token is renewed once and the delete retried
//! - **Dry run**: report what would be deleted without touching the registry
//!
//! # Main Types
//!
//! - [`Reaper`] - Main entry point for retention runs
//! - [`ReaperBuilder`] - Builder for advanced configuration
//! - [`RunSummary`] - Counts reported at the end of a run
//! - [`RetentionPolicy`] - How many images survive per repository
//! - [`CredentialProvider`] - Source of tokens and the project id
//!
//! # Architecture
//!
//! A run flows through the modules in order: [`catalog`] discovers the
//! owned repositories, [`inventory`] lists their images, [`retention`]
//! picks the deletion candidates and [`deletion`] removes them.

#![warn(clippy::all)]

/// Returns the libreap crate version.
///
/// # Examples
///
/// ```
/// let version = libreap::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// High-level public API (main entry point)
mod reaper;
pub use reaper::{Reaper, ReaperBuilder, RunSummary};

// Re-export commonly used types for convenience
pub use auth::{
    CredentialProvider, Credentials, MetadataCredentialProvider, StaticCredentialProvider,
};
pub use config::Config;
pub use error::{ReapError, Result};
pub use retention::RetentionPolicy;

pub mod auth;
pub mod catalog;
pub mod deletion;
pub mod inventory;
pub mod retention;

#[doc(hidden)]
pub mod client;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod error;
