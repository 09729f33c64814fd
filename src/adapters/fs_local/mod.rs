// Local filesystem adapter - Directory scanning and file moves

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Filesystem adapter over the local disk
///
/// Dot-files are never listed.
pub struct FsLocalAdapter;

impl Default for FsLocalAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FsLocalAdapter {
    /// Create new local filesystem adapter
    pub fn new() -> Self {
        Self
    }

    fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn directory_exists(&self, dir_path: &Path) -> Result<bool, DomainError> {
        Ok(dir_path.exists() && dir_path.is_dir())
    }

    async fn list_directory(&self, dir_path: &Path) -> Result<Vec<RawEntry>, DomainError> {
        if !self.directory_exists(dir_path).await? {
            return Err(DomainError::FsFail(format!(
                "Input path does not exist: {}",
                dir_path.display()
            )));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir_path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry
                .map_err(|e| DomainError::FsFail(format!("Failed to read directory entry: {}", e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if Self::is_hidden(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| DomainError::FsFail(format!("Failed to get file metadata: {}", e)))?;
            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

            entries.push(RawEntry {
                path: entry.into_path(),
                size_bytes: metadata.len(),
                modified,
            });
        }

        debug!(dir = %dir_path.display(), count = entries.len(), "Directory listed");
        Ok(entries)
    }

    async fn file_size(&self, file_path: &Path) -> Result<u64, DomainError> {
        let metadata = fs::metadata(file_path)
            .map_err(|e| DomainError::FsFail(format!("Failed to get file size: {}", e)))?;
        Ok(metadata.len())
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DomainError::FsFail(format!("Failed to create directory: {}", e)))?;
        }

        // rename fails across filesystems (e.g. temp dir on tmpfs); fall back to copy + delete
        if fs::rename(from, to).is_err() {
            fs::copy(from, to).map_err(|e| {
                DomainError::FsFail(format!(
                    "Failed to move file from {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                ))
            })?;
            fs::remove_file(from)
                .map_err(|e| DomainError::FsFail(format!("Failed to delete file: {}", e)))?;
        }
        Ok(())
    }
}
