//! Error types for cache operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error during file operations.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// HTTP request error during API calls or downloads.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A manifest file was not found on disk.
    #[error("manifest not found at {path}")]
    ManifestMissing { path: PathBuf },

    /// A manifest file exists but could not be parsed.
    #[error("manifest at {path} is not valid JSON: {source}")]
    ManifestInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// An asset transfer failed after exhausting retries.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// A required credential was not configured.
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}
