//! Windowed batch downloader.
//!
//! Entries are processed in fixed-size windows of `concurrency`
//! transfers. A window is dispatched concurrently and awaited as a whole
//! before the next one starts, with a short pause between windows to
//! avoid hammering the origin. This caps open sockets and keeps progress
//! reporting in window order.

use crate::download::transfer;
use crate::error::CacheError;
use crate::types::{
    unix_now, ApiConfig, DownloadConfig, DownloadResult, ImageMetadata, LocalImageEntry,
    LocalManifest, LocalStats, RemoteManifest, MANIFEST_VERSION,
};
use crate::urls::{asset_url, detect_extension};
use futures_util::future::join_all;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::{info, warn};

/// Aggregate outcome of one batch-download run.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub successful: Vec<DownloadResult>,
    pub failed: Vec<DownloadResult>,
    pub skipped: Vec<DownloadResult>,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len() + self.skipped.len()
    }
}

/// Downloads every entry with bounded concurrency, per-item retries and
/// skip-if-exists semantics.
///
/// Individual failures never abort the batch; they land in the `failed`
/// bucket after retries are exhausted. Nothing is persisted here — the
/// caller folds the summary into a local manifest in one write.
pub async fn download_all(
    entries: &[(String, ImageMetadata)],
    api: &ApiConfig,
    config: &DownloadConfig,
) -> Result<DownloadSummary, CacheError> {
    tokio::fs::create_dir_all(&config.output_dir).await?;

    let client = Client::new();
    let pb = indicatif::ProgressBar::new(entries.len() as u64);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg} | {elapsed_precise} elapsed")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );
    pb.set_message(format!("📦 Downloading {} image(s)", entries.len()));

    let mut summary = DownloadSummary::default();

    for (window_index, window) in entries.chunks(config.concurrency.max(1)).enumerate() {
        if window_index > 0 && !config.window_pause.is_zero() {
            tokio::time::sleep(config.window_pause).await;
        }

        let results = join_all(
            window
                .iter()
                .map(|(id, meta)| download_one(&client, api, config, id, meta)),
        )
        .await;

        for result in results {
            pb.inc(1);
            if let Some(reason) = &result.skip_reason {
                pb.set_message(format!("| ⏭️  {}: {}", result.id, reason));
                summary.skipped.push(result);
            } else if let Some(error) = &result.error {
                pb.set_message(format!("| ❌ {}", result.id));
                warn!("download of {} failed: {}", result.id, error);
                summary.failed.push(result);
            } else {
                pb.set_message(format!("| ✅ {}", result.id));
                summary.successful.push(result);
            }
        }
    }

    pb.finish_with_message(format!(
        "Done: {} downloaded, {} skipped, {} failed",
        summary.successful.len(),
        summary.skipped.len(),
        summary.failed.len()
    ));
    info!(
        "batch finished: {} downloaded, {} skipped, {} failed",
        summary.successful.len(),
        summary.skipped.len(),
        summary.failed.len()
    );

    Ok(summary)
}

/// Resolves one entry to a destination path and transfers it, unless the
/// file is already on disk.
async fn download_one(
    client: &Client,
    api: &ApiConfig,
    config: &DownloadConfig,
    id: &str,
    meta: &ImageMetadata,
) -> DownloadResult {
    let (url, unwatermarked) = asset_url(api, meta, config.target_width, config.target_quality);
    let dest = destination(config, id, &url);

    // Skip semantics are authoritative: an existing file is never
    // re-downloaded or overwritten in the same run.
    if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
        return DownloadResult {
            id: id.to_string(),
            path: dest,
            url,
            unwatermarked,
            bytes: None,
            error: None,
            skip_reason: Some("already exists".to_string()),
        };
    }

    let outcome = Retry::spawn(backoff_schedule(config), || {
        let url = url.clone();
        let dest = dest.clone();
        async move {
            match transfer(client, &url, &dest, config.timeout).await {
                Ok(bytes) => Ok(bytes),
                Err(e) => {
                    warn!("transfer attempt for {} failed: {}", dest.display(), e);
                    // Per-attempt errors keep their kind for logging; the
                    // post-retry failure is recorded as a transfer error.
                    RetryError::to_transient(CacheError::Transfer(e.to_string()))
                }
            }
        }
    })
    .await;

    match outcome {
        Ok(bytes) => DownloadResult {
            id: id.to_string(),
            path: dest,
            url,
            unwatermarked,
            bytes: Some(bytes),
            error: None,
            skip_reason: None,
        },
        Err(e) => DownloadResult {
            id: id.to_string(),
            path: dest,
            url,
            unwatermarked,
            bytes: None,
            error: Some(e.to_string()),
            skip_reason: None,
        },
    }
}

/// Linearly increasing delays between attempts: `attempt * backoff_base`.
/// `max_retries` bounds the total attempt count.
fn backoff_schedule(config: &DownloadConfig) -> Vec<Duration> {
    (1..config.max_retries)
        .map(|attempt| config.backoff_base * attempt)
        .collect()
}

/// `<output_dir>/<sanitized id>.<detected extension>`
fn destination(config: &DownloadConfig, id: &str, url: &str) -> PathBuf {
    let name = format!(
        "{}.{}",
        sanitize_filename::sanitize(id),
        detect_extension(url)
    );
    config.output_dir.join(name)
}

/// Folds a batch summary into the local-file manifest.
///
/// Entries are only created for identifiers present in the remote
/// manifest the run consumed; failed items appear in the stats but get no
/// mapping entry.
pub fn build_local_manifest(summary: &DownloadSummary, remote: &RemoteManifest) -> LocalManifest {
    let mut images = std::collections::HashMap::new();

    for result in &summary.successful {
        let Some(meta) = remote.images.get(&result.id) else {
            continue;
        };
        images.insert(
            result.id.clone(),
            LocalImageEntry::Downloaded {
                local_path: result.path.to_string_lossy().into_owned(),
                download_url: result.url.clone(),
                source_url: format!("https://unsplash.com/photos/{}", result.id),
                author: meta.author.clone(),
                downloaded_at: unix_now(),
                unwatermarked: result.unwatermarked,
            },
        );
    }

    for result in &summary.skipped {
        if !remote.images.contains_key(&result.id) {
            continue;
        }
        images.insert(
            result.id.clone(),
            LocalImageEntry::Skipped {
                local_path: result.path.to_string_lossy().into_owned(),
                skipped: true,
                reason: result
                    .skip_reason
                    .clone()
                    .unwrap_or_else(|| "already exists".to_string()),
            },
        );
    }

    LocalManifest {
        generated_at: unix_now(),
        version: MANIFEST_VERSION.to_string(),
        source_generated_at: remote.generated_at,
        images,
        stats: LocalStats {
            total: summary.total(),
            downloaded: summary.successful.len(),
            failed: summary.failed.len(),
            skipped: summary.skipped.len(),
        },
    }
}
