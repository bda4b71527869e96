//! Local media files owned by a single delivery.
//!
//! A delivery owns the downloaded file and everything it derives from it.
//! `ArtifactGuard` records those paths and removes all of them when the
//! delivery finishes, including when the task unwinds from a panic.

use std::io;
use std::path::{Path, PathBuf};

use crate::download::error::DeliveryError;

/// A local media file. Size and existence are read from disk on every call
/// because an external encoder may have replaced or removed the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    path: PathBuf,
}

impl MediaArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Current size in bytes, or `FileMissing` if the file is gone.
    pub async fn size(&self) -> Result<u64, DeliveryError> {
        fs_err::tokio::metadata(&self.path)
            .await
            .map(|meta| meta.len())
            .map_err(|e| DeliveryError::FileMissing(e.to_string()))
    }

    /// Sibling path for the re-encoded copy: `dir/<stem>_compressed.mp4`.
    pub fn compressed_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.path.with_file_name(format!("{}_compressed.mp4", stem))
    }
}

/// Removes a file, treating "already gone" as success.
///
/// Returns `true` if this call removed the file. Other failures (permissions,
/// busy file) are logged and swallowed so they never mask the outcome of the
/// delivery being reported.
pub fn remove_artifact(path: &Path) -> bool {
    match fs_err::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed artifact {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            log::warn!("Failed to remove artifact: {}", e);
            false
        }
    }
}

/// Owns the paths created or received during one delivery.
#[derive(Debug, Default)]
pub struct ArtifactGuard {
    paths: Vec<PathBuf>,
}

impl ArtifactGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a path for removal. Registering the same path twice is harmless.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Removes every tracked path. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        for path in &self.paths {
            remove_artifact(path);
        }
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}
