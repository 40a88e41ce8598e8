//! Local cache maintenance: statistics and purge.

use crate::manifest::LOCAL_MANIFEST_FILE;
use std::path::Path;
use tracing::{debug, info, warn};

/// Snapshot of the cache directory contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of cached asset files (the manifest is not counted).
    pub file_count: usize,
    /// Combined size of the cached asset files.
    pub total_bytes: u64,
    /// Whether a local manifest document is present.
    pub has_manifest: bool,
}

/// Outcome of a purge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeReport {
    /// Asset files removed (the manifest is removed too but not counted).
    pub removed_files: usize,
    pub freed_bytes: u64,
}

/// Reports on the cache directory. A missing directory yields all-zero
/// stats, not an error.
pub fn stats(dir: &Path) -> CacheStats {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return CacheStats::default(),
    };

    let mut result = CacheStats::default();
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        if entry.file_name() == LOCAL_MANIFEST_FILE {
            result.has_manifest = true;
            continue;
        }
        result.file_count += 1;
        result.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
    }
    result
}

/// Removes every cached asset file, then the local manifest last.
///
/// A missing directory is a no-op success. Individual removal failures
/// are logged and skipped; the purge always runs to completion.
pub fn purge(dir: &Path) -> PurgeReport {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("cache dir {} not readable ({}), nothing to purge", dir.display(), e);
            return PurgeReport::default();
        }
    };

    let mut report = PurgeReport::default();
    let mut manifest_present = false;

    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        // The manifest document goes last, after the assets it describes.
        if entry.file_name() == LOCAL_MANIFEST_FILE {
            manifest_present = true;
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                report.removed_files += 1;
                report.freed_bytes += size;
            }
            Err(e) => {
                warn!("could not remove {}: {}", entry.path().display(), e);
            }
        }
    }

    if manifest_present {
        let manifest_path = dir.join(LOCAL_MANIFEST_FILE);
        if let Err(e) = std::fs::remove_file(&manifest_path) {
            warn!("could not remove {}: {}", manifest_path.display(), e);
        }
    }

    info!(
        "purged {} file(s), freed {} byte(s) from {}",
        report.removed_files,
        report.freed_bytes,
        dir.display()
    );
    report
}
