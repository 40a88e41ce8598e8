//! End-to-end pipeline entry points: manifest build and batch download.

use crate::batch::{build_local_manifest, download_all, DownloadSummary};
use crate::error::CacheError;
use crate::manifest;
use crate::metadata;
use crate::resolver::resolve;
use crate::scanner;
use crate::types::{
    unix_now, ApiConfig, BuildEnvironment, DownloadConfig, LocalManifest, RemoteManifest,
    RemoteStats, MANIFEST_VERSION,
};
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Scans a content tree and builds the remote-metadata manifest.
///
/// Metadata is fetched exactly once per unique identifier, sequentially —
/// each successful fetch already carries a mandatory tracking call, and
/// interleaving those would serve no one. Without an access key the
/// result degrades to an empty fallback manifest rather than an error.
pub async fn build_remote_manifest(
    content_dir: &Path,
    api: &ApiConfig,
    config: &DownloadConfig,
) -> Result<RemoteManifest, CacheError> {
    let urls = scanner::scan(content_dir);
    // BTreeSet gives a stable fetch order run to run.
    let ids: BTreeSet<String> = urls.iter().filter_map(|u| resolve(u)).collect();
    info!(
        "found {} URL(s) referencing {} unique photo(s) under {}",
        urls.len(),
        ids.len(),
        content_dir.display()
    );

    if api.access_key.is_none() {
        warn!("UNSPLASH_ACCESS_KEY not set; writing an empty fallback manifest");
        return Ok(RemoteManifest::empty(true));
    }

    let client = Client::new();
    let pb = indicatif::ProgressBar::new(ids.len() as u64);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg} | {elapsed_precise} elapsed")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );
    pb.set_message(format!("🔍 Fetching metadata for {} photo(s)", ids.len()));

    let mut images = std::collections::HashMap::new();
    let mut failed = 0usize;
    for id in &ids {
        match metadata::fetch(&client, api, id, config.target_width, config.target_quality).await {
            Some(meta) => {
                pb.set_message(format!("| ✅ {}", id));
                images.insert(id.clone(), meta);
            }
            None => {
                pb.set_message(format!("| ❌ {}", id));
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!(
        "Metadata: {} fetched, {} failed",
        images.len(),
        failed
    ));

    let succeeded = images.len();
    Ok(RemoteManifest {
        generated_at: unix_now(),
        version: MANIFEST_VERSION.to_string(),
        images,
        stats: RemoteStats {
            total_found: ids.len(),
            succeeded,
            failed,
            success_rate: success_rate(succeeded, ids.len()),
        },
        environment: BuildEnvironment {
            premium: api.has_premium(),
            fallback: false,
        },
    })
}

/// Runs the batch downloader against a previously built remote manifest
/// and writes the local manifest in one piece afterwards.
///
/// Returns the summary and the folded local manifest. A missing remote
/// manifest is fatal to the run; the caller surfaces the actionable
/// message.
pub async fn run_download(
    remote_path: &Path,
    api: &ApiConfig,
    config: &DownloadConfig,
) -> Result<(DownloadSummary, LocalManifest), CacheError> {
    let remote = manifest::load_remote(remote_path)?;

    let mut entries: Vec<_> = remote
        .images
        .iter()
        .map(|(id, meta)| (id.clone(), meta.clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let summary = download_all(&entries, api, config).await?;
    let local = build_local_manifest(&summary, &remote);
    manifest::save_local(&config.output_dir.join(manifest::LOCAL_MANIFEST_FILE), &local)?;

    Ok((summary, local))
}

fn success_rate(succeeded: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", succeeded as f64 / total as f64 * 100.0)
}
