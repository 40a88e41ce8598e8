//! Photo identifier extraction from Unsplash page URLs.
//!
//! Identifiers are opaque 11-character tokens from `[A-Za-z0-9_-]`. They
//! are only ever derived from URLs, never generated locally.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// `/photos/{slug}-{id}` — the slug form takes priority over the bare-id
/// form so that ids containing `-` are not misparsed.
static SLUG_WITH_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/photos/[A-Za-z0-9][A-Za-z0-9_-]*-([A-Za-z0-9_-]{11})(?:/|$)").unwrap()
});

/// `/photos/{id}` with nothing else in the segment.
static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/photos/([A-Za-z0-9_-]{11})(?:/|$)").unwrap());

/// A whole path segment that is exactly an identifier.
static ID_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Punctuation commonly stuck to URLs copied out of prose.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

/// Extracts the stable photo identifier from a supported Unsplash URL.
///
/// Returns `None` — never panics — for anything that is not an Unsplash
/// photo URL, including well-formed URLs on unrelated hosts.
///
/// # Example
///
/// ```
/// use unsplash_cache::resolver::resolve;
///
/// let id = resolve("https://unsplash.com/photos/beautiful-sunset-abc12345678");
/// assert_eq!(id.as_deref(), Some("abc12345678"));
/// ```
pub fn resolve(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches(TRAILING_PUNCTUATION);
    let url = Url::parse(trimmed).ok()?;

    let host = url.host_str()?;
    if host != "unsplash.com" && !host.ends_with(".unsplash.com") {
        return None;
    }

    let path = url.path();
    if let Some(caps) = SLUG_WITH_ID.captures(path) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = BARE_ID.captures(path) {
        return Some(caps[1].to_string());
    }

    // Fall back to any URL whose final segment is exactly an identifier
    // (query/fragment already stripped by the URL parser).
    let last = path.rsplit('/').next()?;
    if ID_SEGMENT.is_match(last) {
        return Some(last.to_string());
    }

    None
}
