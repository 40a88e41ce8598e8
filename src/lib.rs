//! unsplash-cache - Build-time Unsplash image cacher and local mirror
//!
//! This library scans a content tree for Unsplash photo references,
//! fetches authoritative metadata exactly once per photo (issuing the
//! provider-mandated download-tracking call along the way), persists a
//! versioned manifest, and mirrors the resolved assets to local storage
//! with a bounded-concurrency, retrying, resumable batch download.
//!
//! # Features
//!
//! - **Idempotent caching**: re-running against the same manifest and
//!   destination performs zero new transfers
//! - **Bounded concurrency**: fixed-size download windows with a barrier
//!   and pause between them
//! - **Automatic retry**: linear-increasing backoff per asset
//! - **Premium support**: unwatermarked renditions when an Unsplash+
//!   secret key is configured, graceful degradation when it is not
//!
//! # Example
//!
//! ```no_run
//! use unsplash_cache::{run_download, ApiConfig, DownloadConfig};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiConfig::default();
//! let config = DownloadConfig::default();
//! let (summary, _local) =
//!     run_download(Path::new("data/unsplash-images.json"), &api, &config).await?;
//! println!("downloaded {}", summary.successful.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod download;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod pipeline;
pub mod resolver;
pub mod scanner;
pub mod types;
pub mod urls;

pub use batch::{build_local_manifest, download_all, DownloadSummary};
pub use cache::{purge, stats, CacheStats, PurgeReport};
pub use error::CacheError;
pub use pipeline::{build_remote_manifest, run_download};
pub use types::{
    ApiConfig, DownloadConfig, DownloadResult, ImageMetadata, LocalImageEntry, LocalManifest,
    RemoteManifest,
};
