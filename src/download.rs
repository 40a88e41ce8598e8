//! Single-asset transfer.

use crate::error::CacheError;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

/// Streams one asset from `url` into `dest`.
///
/// Bytes are written to a `.part` sibling and renamed into place on
/// success, so an aborted run never leaves a truncated file at the final
/// path. The deadline covers the whole request, headers and body.
///
/// Returns the number of bytes written.
pub(crate) async fn transfer(
    client: &Client,
    url: &str,
    dest: &Path,
    timeout: Duration,
) -> Result<u64, CacheError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let part_path = part_path(dest);
    let result = stream_to(client, url, &part_path, timeout).await;

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&part_path, dest).await?;
            debug!("wrote {} bytes to {}", bytes, dest.display());
            Ok(bytes)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            Err(e)
        }
    }
}

async fn stream_to(
    client: &Client,
    url: &str,
    part_path: &Path,
    timeout: Duration,
) -> Result<u64, CacheError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    let mut file = BufWriter::new(tokio::fs::File::create(part_path).await?);
    let mut byte_stream = response.bytes_stream();
    let mut bytes_written = 0u64;

    while let Some(piece) = byte_stream.next().await {
        let chunk = piece?;
        bytes_written += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(bytes_written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut os = dest.as_os_str().to_os_string();
    os.push(".part");
    PathBuf::from(os)
}
