// src/errors.rs

//! Crate-wide error types.
//!
//! Two layers:
//! - [`BackendError`] covers failures at the native watcher boundary. The core
//!   never wraps or retries these; they travel up unchanged inside
//!   [`LiveGlobError::Backend`].
//! - [`LiveGlobError`] is what library callers see.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a watcher backend while starting or stopping.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend cannot provide something the core requires.
    #[error("Backend capability error: {0}")]
    Capability(String),

    /// Establishing or tearing down the OS subscription failed.
    #[error("Backend subscription error ({context}): {source}")]
    Subscription {
        context: String,
        #[source]
        source: notify::Error,
    },

    /// Enumerating the initial tree failed.
    #[error("Initial scan of {path:?} failed: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl BackendError {
    pub(crate) fn subscription(context: impl Into<String>, source: notify::Error) -> Self {
        BackendError::Subscription {
            context: context.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum LiveGlobError {
    #[error("This factory has already been closed.")]
    AlreadyClosed,

    #[error("At least one non-negated glob pattern is required")]
    EmptyPatterns,

    #[error("Invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, LiveGlobError>;
