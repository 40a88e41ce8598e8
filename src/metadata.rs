//! Photo metadata fetching and download tracking.
//!
//! One successful metadata fetch triggers exactly one download-tracking
//! call, as the provider's API terms require. The tracking call is
//! fire-and-forget: its failure is logged and swallowed, and it is never
//! retried, since the terms require the attempt rather than its success.

use crate::types::{unix_now, ApiConfig, ImageMetadata};
use crate::urls::build_optimized_url;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    id: String,
    width: u32,
    height: u32,
    description: Option<String>,
    alt_description: Option<String>,
    urls: PhotoUrls,
    user: PhotoUser,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    raw: String,
    full: String,
    regular: String,
    small: String,
    thumb: String,
}

#[derive(Debug, Deserialize)]
struct PhotoUser {
    name: String,
    username: String,
    #[serde(default)]
    links: Option<PhotoUserLinks>,
}

#[derive(Debug, Deserialize)]
struct PhotoUserLinks {
    html: Option<String>,
}

/// Fetches authoritative metadata for one photo identifier.
///
/// Returns `None` — never an error — on any provider failure, so one bad
/// photo never aborts a manifest build. Rate-limit responses (403/429)
/// get a distinct diagnostic but the same `None`.
pub async fn fetch(
    client: &Client,
    api: &ApiConfig,
    id: &str,
    width: u32,
    quality: u32,
) -> Option<ImageMetadata> {
    let Some(access_key) = api.access_key.as_deref() else {
        warn!("no access key configured, cannot fetch metadata for {}", id);
        return None;
    };

    let url = format!("{}/photos/{}", api.api_base, id);
    debug!("fetching metadata from {}", url);

    let response = match client
        .get(&url)
        .header("Authorization", format!("Client-ID {}", access_key))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!("metadata request for {} failed: {}", id, e);
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        if status.as_u16() == 429 || status.as_u16() == 403 {
            warn!(
                "rate limited fetching {} (HTTP {}): the hourly request quota is likely exhausted",
                id, status
            );
        } else {
            warn!("metadata fetch for {} returned HTTP {}", id, status);
        }
        return None;
    }

    let photo = match response.json::<PhotoResponse>().await {
        Ok(p) => p,
        Err(e) => {
            warn!("invalid metadata payload for {}: {}", id, e);
            return None;
        }
    };

    let metadata = to_metadata(photo, api, width, quality);

    // Mandatory per-fetch tracking call. Exactly once, never retried.
    track_download(client, api, access_key, id).await;

    Some(metadata)
}

/// Issues the provider's download-tracking call for an identifier.
///
/// Failures are logged only; the fetched metadata is returned regardless.
async fn track_download(client: &Client, api: &ApiConfig, access_key: &str, id: &str) {
    let url = format!("{}/photos/{}/download", api.api_base, id);
    match client
        .get(&url)
        .header("Authorization", format!("Client-ID {}", access_key))
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => {
            info!("registered download for {}", id);
        }
        Ok(r) => {
            warn!("download tracking for {} returned HTTP {}", id, r.status());
        }
        Err(e) => {
            warn!("download tracking for {} failed: {}", id, e);
        }
    }
}

fn to_metadata(photo: PhotoResponse, api: &ApiConfig, width: u32, quality: u32) -> ImageMetadata {
    let optimized_url = build_optimized_url(api, &photo.urls.regular, width, quality);
    let author_url = photo
        .user
        .links
        .as_ref()
        .and_then(|l| l.html.clone())
        .unwrap_or_else(|| format!("https://unsplash.com/@{}", photo.user.username));

    let urls = [
        ("raw", photo.urls.raw),
        ("full", photo.urls.full),
        ("regular", photo.urls.regular),
        ("small", photo.urls.small),
        ("thumb", photo.urls.thumb),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    ImageMetadata {
        id: photo.id,
        optimized_url,
        urls,
        author: photo.user.name,
        author_url,
        description: photo.description.or(photo.alt_description),
        width: photo.width,
        height: photo.height,
        cached_at: unix_now(),
    }
}
