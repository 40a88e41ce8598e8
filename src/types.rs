//! Configuration objects and manifest data structures.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Format tag written into every manifest document.
pub const MANIFEST_VERSION: &str = "1.0";

/// Current time as seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Credentials and endpoint for the Unsplash API.
///
/// Constructed once at process start and passed by reference into the
/// metadata fetcher and URL builder. Nothing below `main` reads the
/// process environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Access key sent as `Client-ID` on every read request.
    pub access_key: Option<String>,
    /// Unsplash+ secret key. Optional; unlocks unwatermarked premium
    /// renditions. Absence degrades gracefully, never errors.
    pub secret_key: Option<String>,
    /// API base URL (e.g. `https://api.unsplash.com`). Overridable so
    /// tests can point at a local mock server.
    pub api_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            api_base: "https://api.unsplash.com".to_string(),
        }
    }
}

impl ApiConfig {
    /// Whether premium (unwatermarked) URL construction is unlocked.
    pub fn has_premium(&self) -> bool {
        self.secret_key.is_some()
    }
}

/// Configuration for the batch downloader.
///
/// # Example
///
/// ```
/// use unsplash_cache::DownloadConfig;
///
/// let config = DownloadConfig {
///     concurrency: 5,
///     ..DownloadConfig::default()
/// };
/// assert_eq!(config.max_retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Window size: number of transfers dispatched concurrently.
    /// Downloads are I/O-bound, so this caps open sockets, not CPU.
    pub concurrency: usize,
    /// Pause between windows, to avoid hammering the origin.
    pub window_pause: Duration,
    /// Per-attempt transfer timeout.
    pub timeout: Duration,
    /// Total transfer attempts per asset, the first try included.
    pub max_retries: u32,
    /// Base unit for the linear-increasing backoff (`attempt * base`).
    pub backoff_base: Duration,
    /// Directory downloaded assets are written into.
    pub output_dir: PathBuf,
    /// Width requested for optimized/premium renditions.
    pub target_width: u32,
    /// Quality requested for optimized/premium renditions.
    pub target_quality: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            window_pause: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            output_dir: PathBuf::from("public/images/unsplash"),
            target_width: 1080,
            target_quality: 80,
        }
    }
}

/// Cached metadata for one remote photo.
///
/// Immutable once written; a re-fetch replaces the whole entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    /// Stable 11-character photo identifier.
    pub id: String,
    /// The `regular` rendition, premium-adjusted when a secret key was
    /// configured at fetch time.
    pub optimized_url: String,
    /// Size-variant name (`raw`, `full`, `regular`, `small`, `thumb`) to URL.
    pub urls: HashMap<String, String>,
    /// Photographer display name.
    pub author: String,
    /// Photographer profile page.
    pub author_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Unix timestamp when this entry was fetched.
    pub cached_at: i64,
}

/// Aggregate counters for a remote-manifest build.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RemoteStats {
    pub total_found: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Human-readable success rate, e.g. `"95.0%"`.
    pub success_rate: String,
}

/// Records the environment a remote manifest was built in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BuildEnvironment {
    /// Whether an Unsplash+ secret key was present during the build.
    pub premium: bool,
    /// Set when the manifest was built without credentials and is an
    /// empty fallback document.
    pub fallback: bool,
}

/// Manifest mapping photo identifiers to cached remote metadata.
///
/// Regenerated wholesale on each build; never partially patched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RemoteManifest {
    pub generated_at: i64,
    pub version: String,
    pub images: HashMap<String, ImageMetadata>,
    pub stats: RemoteStats,
    pub environment: BuildEnvironment,
}

impl RemoteManifest {
    /// An empty manifest, used as the no-credential fallback.
    pub fn empty(fallback: bool) -> Self {
        Self {
            generated_at: unix_now(),
            version: MANIFEST_VERSION.to_string(),
            images: HashMap::new(),
            stats: RemoteStats {
                success_rate: "0.0%".to_string(),
                ..RemoteStats::default()
            },
            environment: BuildEnvironment {
                premium: false,
                fallback,
            },
        }
    }
}

/// One entry in the local-file manifest: either a completed download or a
/// file that was already on disk when the run started.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LocalImageEntry {
    Downloaded {
        local_path: String,
        download_url: String,
        source_url: String,
        author: String,
        downloaded_at: i64,
        /// False when the run fell back to the (possibly watermarked)
        /// optimized URL.
        unwatermarked: bool,
    },
    Skipped {
        local_path: String,
        skipped: bool,
        reason: String,
    },
}

/// Aggregate counters for a batch-download run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LocalStats {
    pub total: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Manifest mapping photo identifiers to local files.
///
/// Rebuilt wholesale after each batch-download run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocalManifest {
    pub generated_at: i64,
    pub version: String,
    /// `generated_at` of the remote manifest this run consumed.
    pub source_generated_at: i64,
    pub images: HashMap<String, LocalImageEntry>,
    pub stats: LocalStats,
}

/// Transient per-item outcome of one batch-download entry.
///
/// Never persisted directly; folded into [`LocalManifest`].
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub id: String,
    pub path: PathBuf,
    pub url: String,
    pub unwatermarked: bool,
    pub bytes: Option<u64>,
    pub error: Option<String>,
    pub skip_reason: Option<String>,
}
