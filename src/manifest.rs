//! Manifest persistence.
//!
//! Both manifest documents are pretty-printed JSON, written wholesale —
//! there is no merge or partial patching. Callers decide what a missing
//! manifest means: fatal for a download run, "already clean" for purge.

use crate::error::CacheError;
use crate::types::{LocalManifest, RemoteManifest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::info;

/// Default filename of the remote-metadata manifest.
pub const REMOTE_MANIFEST_FILE: &str = "unsplash-images.json";
/// Default filename of the local-file manifest, kept inside the cache
/// directory next to the assets it describes.
pub const LOCAL_MANIFEST_FILE: &str = "downloaded-images.json";

fn load<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CacheError::ManifestMissing {
                path: path.to_path_buf(),
            }
        } else {
            CacheError::Io(e)
        }
    })?;
    serde_json::from_str(&content).map_err(|source| CacheError::ManifestInvalid {
        path: path.to_path_buf(),
        source,
    })
}

fn save<T: Serialize>(path: &Path, manifest: &T) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Loads the remote-metadata manifest.
pub fn load_remote(path: &Path) -> Result<RemoteManifest, CacheError> {
    load(path)
}

/// Writes the remote-metadata manifest, replacing any previous document.
pub fn save_remote(path: &Path, manifest: &RemoteManifest) -> Result<(), CacheError> {
    save(path, manifest)?;
    info!(
        "wrote remote manifest with {} image(s) to {}",
        manifest.images.len(),
        path.display()
    );
    Ok(())
}

/// Loads the local-file manifest.
pub fn load_local(path: &Path) -> Result<LocalManifest, CacheError> {
    load(path)
}

/// Writes the local-file manifest, replacing any previous document.
pub fn save_local(path: &Path, manifest: &LocalManifest) -> Result<(), CacheError> {
    save(path, manifest)?;
    info!(
        "wrote local manifest with {} entr(ies) to {}",
        manifest.images.len(),
        path.display()
    );
    Ok(())
}
