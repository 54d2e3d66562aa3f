//! Errors that abort a run.
//!
//! Refused deletes and expired tokens are absorbed by the deletion protocol
//! and never become a [`ReapError`]; they only lower the run counters. What
//! is left is a short list: the registry could not be reached, it refused a
//! listing, it sent something unreadable, or the job is misconfigured.

use reqwest::StatusCode;
use std::error::Error as StdError;
use thiserror::Error;


type BoxedSource = Box<dyn StdError + Send + Sync>;

#[derive(Error, Debug)]
pub enum ReapError {
    /// No usable response: refused connection, timeout, truncated body
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A listing or metadata request answered with a non-2xx status
    #[error("{url} answered HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// A response arrived but its content is not what was expected
    #[error("unreadable {what}")]
    Parse {
        what: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<config::ConfigError>,
    },
}

pub type Result<T> = std::result::Result<T, ReapError>;

impl ReapError {
    pub(crate) fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn timeout(url: &str, seconds: u64) -> Self {
        Self::Transport {
            message: format!("request to {} timed out after {}s", url, seconds),
            source: None,
        }
    }

    pub(crate) fn status(url: &str, status: StatusCode, body: &str) -> Self {
        Self::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: body.trim().to_string(),
        }
    }

    pub(crate) fn parse<E>(what: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Parse {
            what: what.into(),
            source: Some(Box::new(source)),
        }
    }

    /// A value that parsed but makes no sense, e.g. an out-of-range timestamp.
    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            source: None,
        }
    }

    pub(crate) fn config(message: impl Into<String>, path: Option<&str>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(str::to_string),
            source: None,
        }
    }

    pub(crate) fn config_source(message: impl Into<String>, source: config::ConfigError) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
            source: Some(source),
        }
    }

    /// HTTP status of a refused request, when that is what aborted the run.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
