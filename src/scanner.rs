//! Content-tree scanning for referenced photo URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// File extensions treated as content documents.
const CONTENT_EXTENSIONS: &[&str] = &["md", "mdx", "markdown"];

/// Frontmatter `image:` field, quoted or not.
static FRONTMATTER_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^image:\s*["']?(https?://[^\s"']+)"#).unwrap());

/// Unsplash photo-page URLs anywhere in a document body.
static PHOTO_PAGE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https://(?:www\.)?unsplash\.com/photos/[^\s)"'<>\]]+"#).unwrap());

/// Recursively scans a content tree and collects every referenced
/// Unsplash photo URL, deduplicated.
///
/// Unreadable entries and non-content files are skipped silently at the
/// per-entry level; the walk itself is restartable and keeps no cursor.
pub fn scan(root: &Path) -> HashSet<String> {
    let mut urls = HashSet::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| match e {
        Ok(entry) => Some(entry),
        Err(e) => {
            debug!("skipping unreadable entry: {}", e);
            None
        }
    }) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_content = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| CONTENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_content {
            continue;
        }

        match std::fs::read_to_string(entry.path()) {
            Ok(content) => {
                for url in extract_urls(&content) {
                    urls.insert(url);
                }
            }
            Err(e) => {
                debug!("skipping unreadable file {}: {}", entry.path().display(), e);
            }
        }
    }

    urls
}

/// Extracts photo URLs from one document: the frontmatter `image:` field
/// (when it points at Unsplash) plus every photo-page URL in the body.
pub fn extract_urls(content: &str) -> Vec<String> {
    let mut found = Vec::new();

    if let Some(frontmatter) = frontmatter_block(content) {
        for caps in FRONTMATTER_IMAGE.captures_iter(frontmatter) {
            let url = caps[1].to_string();
            if url.contains("unsplash.com") {
                found.push(url);
            }
        }
    }

    for m in PHOTO_PAGE_URL.find_iter(content) {
        found.push(m.as_str().to_string());
    }

    found
}

/// The YAML frontmatter slice between leading `---` fences, if any.
fn frontmatter_block(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DOC_WITH_FRONTMATTER: &str = "---\n\
        title: Hello\n\
        image: https://unsplash.com/photos/beautiful-sunset-abc12345678\n\
        ---\n\
        Body text.\n";

    const DOC_WITH_BODY_LINK: &str = "# Post\n\
        Photo credit: [link](https://unsplash.com/photos/beautiful-sunset-abc12345678).\n";

    #[test]
    fn extracts_frontmatter_image() {
        let urls = extract_urls(DOC_WITH_FRONTMATTER);
        assert_eq!(
            urls,
            vec!["https://unsplash.com/photos/beautiful-sunset-abc12345678".to_string()]
        );
    }

    #[test]
    fn ignores_non_unsplash_frontmatter_image() {
        let doc = "---\nimage: https://example.com/pic.png\n---\nBody.\n";
        assert!(extract_urls(doc).is_empty());
    }

    #[test]
    fn extracts_body_urls() {
        let urls = extract_urls(DOC_WITH_BODY_LINK);
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://unsplash.com/photos/"));
    }

    #[test]
    fn scan_deduplicates_across_documents() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::write(dir.path().join("a.md"), DOC_WITH_FRONTMATTER).unwrap();
        fs::write(dir.path().join("posts/b.md"), DOC_WITH_BODY_LINK).unwrap();
        fs::write(dir.path().join("ignored.txt"), DOC_WITH_BODY_LINK).unwrap();

        let urls = scan(dir.path());
        // Same photo referenced from frontmatter and body: one entry.
        assert_eq!(urls.len(), 1);
        assert_eq!(
            crate::resolver::resolve(urls.iter().next().unwrap()).as_deref(),
            Some("abc12345678")
        );
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        let urls = scan(Path::new("/nonexistent/content/tree"));
        assert!(urls.is_empty());
    }
}
