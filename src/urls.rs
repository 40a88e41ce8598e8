//! Optimized and premium URL construction.
//!
//! Unsplash serves two content hosts: the standard CDN and the premium
//! (Unsplash+) host. Premium authorization is sensitive to extraneous
//! query parameters, so premium URLs are rebuilt minimally, keeping only
//! the `ixid`/`ixlib` tracking parameters before attaching the credential.

use crate::types::{ApiConfig, ImageMetadata};
use tracing::debug;
use url::Url;

/// Host serving Unsplash+ (premium) renditions.
pub const PREMIUM_HOST: &str = "plus.unsplash.com";
/// Host serving standard CDN renditions.
pub const STANDARD_HOST: &str = "images.unsplash.com";

/// Variant precedence for recovering a tracking parameter. The first URL
/// carrying an `ixid` wins; the order is declared here rather than left
/// implicit.
const IXID_VARIANT_ORDER: &[&str] = &["raw", "full", "regular"];

/// Rewrites a rendition URL for the configured credential, width and
/// quality.
///
/// Without a secret key the input is returned unchanged, byte-for-byte.
/// URL-parse failures also fall back to the unchanged input; this
/// function never fails.
pub fn build_optimized_url(api: &ApiConfig, base_url: &str, width: u32, quality: u32) -> String {
    let Some(secret) = api.secret_key.as_deref() else {
        return base_url.to_string();
    };

    let Ok(url) = Url::parse(base_url) else {
        debug!("unparseable rendition URL, leaving unchanged: {}", base_url);
        return base_url.to_string();
    };

    match url.host_str() {
        Some(PREMIUM_HOST) => premium_url(&url, secret, width, quality),
        Some(STANDARD_HOST) => standard_url(&url, secret, width, quality),
        _ => base_url.to_string(),
    }
}

/// Minimal premium URL: path plus `ixid`/`ixlib` only, then credential,
/// width, quality and a fixed output format.
fn premium_url(url: &Url, secret: &str, width: u32, quality: u32) -> String {
    let tracking: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k == "ixid" || k == "ixlib")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut rebuilt = url.clone();
    rebuilt.set_query(None);
    rebuilt.set_fragment(None);
    {
        let mut pairs = rebuilt.query_pairs_mut();
        for (k, v) in &tracking {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("client_id", secret);
        pairs.append_pair("w", &width.to_string());
        pairs.append_pair("q", &quality.to_string());
        pairs.append_pair("fm", "jpg");
    }
    rebuilt.to_string()
}

/// Standard-CDN URL: existing parameters are preserved and full
/// optimization parameters added alongside the credential.
fn standard_url(url: &Url, secret: &str, width: u32, quality: u32) -> String {
    let mut rebuilt = url.clone();
    {
        let mut pairs = rebuilt.query_pairs_mut();
        pairs.append_pair("fit", "crop");
        pairs.append_pair("crop", "entropy");
        pairs.append_pair("cs", "tinysrgb");
        pairs.append_pair("fm", "jpg");
        pairs.append_pair("w", &width.to_string());
        pairs.append_pair("q", &quality.to_string());
        pairs.append_pair("client_id", secret);
    }
    rebuilt.to_string()
}

/// Extracts the `ixid` query parameter from a URL, if present.
fn ixid_of(raw: &str) -> Option<(String, Url)> {
    let url = Url::parse(raw).ok()?;
    let ixid = url
        .query_pairs()
        .find(|(k, _)| k == "ixid")
        .map(|(_, v)| v.into_owned())?;
    Some((ixid, url))
}

/// Finds the first cached URL carrying an `ixid` tracking parameter.
///
/// Checks the optimized URL first, then the size variants in
/// [`IXID_VARIANT_ORDER`]. Returns the parameter value and the URL that
/// carried it.
pub fn recover_ixid(meta: &ImageMetadata) -> Option<(String, Url)> {
    if let Some(found) = ixid_of(&meta.optimized_url) {
        return Some(found);
    }
    for variant in IXID_VARIANT_ORDER {
        if let Some(found) = meta.urls.get(*variant).and_then(|u| ixid_of(u)) {
            return Some(found);
        }
    }
    None
}

/// Picks the URL an asset should be transferred from.
///
/// Prefers a reconstructed unwatermarked URL (requires a recoverable
/// `ixid` and a configured secret key); otherwise falls back to the
/// optimized URL and flags the result as possibly watermarked.
///
/// Returns `(url, unwatermarked)`.
pub fn asset_url(api: &ApiConfig, meta: &ImageMetadata, width: u32, quality: u32) -> (String, bool) {
    if let Some(secret) = api.secret_key.as_deref() {
        if let Some((ixid, carrier)) = recover_ixid(meta) {
            let mut rebuilt = carrier;
            rebuilt.set_query(None);
            rebuilt.set_fragment(None);
            {
                let mut pairs = rebuilt.query_pairs_mut();
                pairs.append_pair("ixid", &ixid);
                pairs.append_pair("client_id", secret);
                pairs.append_pair("w", &width.to_string());
                pairs.append_pair("q", &quality.to_string());
                pairs.append_pair("fm", "jpg");
            }
            return (rebuilt.to_string(), true);
        }
        debug!("no ixid recoverable for {}, using optimized URL", meta.id);
    }
    (meta.optimized_url.clone(), false)
}

/// Detects the file extension for a downloaded asset: the `fm` query
/// parameter wins, then the path extension, then `jpg`.
pub fn detect_extension(raw: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        if let Some((_, fm)) = url.query_pairs().find(|(k, _)| k == "fm") {
            if !fm.is_empty() {
                return fm.into_owned();
            }
        }
        if let Some(ext) = std::path::Path::new(url.path())
            .extension()
            .and_then(|e| e.to_str())
        {
            return ext.to_string();
        }
    }
    "jpg".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn api_with_secret() -> ApiConfig {
        ApiConfig {
            access_key: Some("access".to_string()),
            secret_key: Some("sekrit".to_string()),
            ..ApiConfig::default()
        }
    }

    fn meta(optimized: &str, urls: &[(&str, &str)]) -> ImageMetadata {
        ImageMetadata {
            id: "abc12345678".to_string(),
            optimized_url: optimized.to_string(),
            urls: urls
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            author: "Jane Doe".to_string(),
            author_url: "https://unsplash.com/@janedoe".to_string(),
            description: None,
            width: 4000,
            height: 3000,
            cached_at: 1_700_000_000,
        }
    }

    #[test]
    fn no_secret_returns_input_unchanged() {
        let api = ApiConfig::default();
        let input = "https://plus.unsplash.com/premium_photo-1?ixid=tok&foo=bar";
        assert_eq!(build_optimized_url(&api, input, 1080, 80), input);
    }

    #[test]
    fn premium_host_keeps_only_tracking_params() {
        let api = api_with_secret();
        let out = build_optimized_url(
            &api,
            "https://plus.unsplash.com/premium_photo-1?ixlib=rb-4.0&ixid=tok&auto=format&sat=-100",
            1080,
            80,
        );
        assert!(out.starts_with("https://plus.unsplash.com/premium_photo-1?"));
        assert!(out.contains("ixid=tok"));
        assert!(out.contains("ixlib=rb-4.0"));
        assert!(out.contains("client_id=sekrit"));
        assert!(out.contains("w=1080"));
        assert!(out.contains("q=80"));
        assert!(out.contains("fm=jpg"));
        assert!(!out.contains("auto=format"));
        assert!(!out.contains("sat="));
    }

    #[test]
    fn standard_host_preserves_existing_params() {
        let api = api_with_secret();
        let out = build_optimized_url(
            &api,
            "https://images.unsplash.com/photo-1?ixid=tok&auto=format",
            800,
            75,
        );
        assert!(out.contains("auto=format"));
        assert!(out.contains("ixid=tok"));
        assert!(out.contains("crop=entropy"));
        assert!(out.contains("cs=tinysrgb"));
        assert!(out.contains("w=800"));
        assert!(out.contains("client_id=sekrit"));
    }

    #[test]
    fn unknown_host_and_garbage_are_left_alone() {
        let api = api_with_secret();
        assert_eq!(
            build_optimized_url(&api, "https://example.com/x.jpg", 1080, 80),
            "https://example.com/x.jpg"
        );
        assert_eq!(build_optimized_url(&api, "not a url", 1080, 80), "not a url");
    }

    #[test]
    fn ixid_recovery_prefers_the_optimized_url() {
        let m = meta(
            "https://images.unsplash.com/photo-1?ixid=from-optimized",
            &[("raw", "https://images.unsplash.com/photo-1?ixid=from-raw")],
        );
        let (ixid, _) = recover_ixid(&m).unwrap();
        assert_eq!(ixid, "from-optimized");
    }

    #[test]
    fn ixid_recovery_walks_variants_in_declared_order() {
        let m = meta(
            "https://images.unsplash.com/photo-1",
            &[
                ("regular", "https://images.unsplash.com/photo-1?ixid=from-regular"),
                ("full", "https://images.unsplash.com/photo-1?ixid=from-full"),
            ],
        );
        let (ixid, _) = recover_ixid(&m).unwrap();
        assert_eq!(ixid, "from-full");
    }

    #[test]
    fn asset_url_falls_back_to_optimized_without_ixid() {
        let api = api_with_secret();
        let m = meta("https://images.unsplash.com/photo-1?q=80", &[]);
        let (url, unwatermarked) = asset_url(&api, &m, 1080, 80);
        assert_eq!(url, m.optimized_url);
        assert!(!unwatermarked);
    }

    #[test]
    fn asset_url_reconstructs_unwatermarked_with_secret() {
        let api = api_with_secret();
        let m = meta(
            "https://plus.unsplash.com/premium_photo-1?ixid=tok&w=400",
            &[],
        );
        let (url, unwatermarked) = asset_url(&api, &m, 1080, 80);
        assert!(unwatermarked);
        assert!(url.contains("ixid=tok"));
        assert!(url.contains("client_id=sekrit"));
        assert!(!url.contains("w=400"));
    }

    #[test]
    fn asset_url_without_secret_is_the_optimized_url() {
        let api = ApiConfig::default();
        let m = meta("https://images.unsplash.com/photo-1?ixid=tok", &[]);
        let (url, unwatermarked) = asset_url(&api, &m, 1080, 80);
        assert_eq!(url, m.optimized_url);
        assert!(!unwatermarked);
    }

    #[test]
    fn extension_detection() {
        assert_eq!(detect_extension("https://images.unsplash.com/photo-1?fm=webp"), "webp");
        assert_eq!(detect_extension("https://images.unsplash.com/photo-1.png"), "png");
        assert_eq!(detect_extension("https://images.unsplash.com/photo-1"), "jpg");
        assert_eq!(detect_extension("garbage"), "jpg");
    }
}
