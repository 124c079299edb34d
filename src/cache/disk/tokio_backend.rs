//! Tokio-based filesystem backend (portable, works on all platforms)

use super::backend::{DiskBackend, EntryKind};
use super::error::DiskCacheError;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Portable filesystem backend using tokio::fs
#[derive(Debug, Default)]
pub struct TokioFsBackend;

impl TokioFsBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Hidden sibling used as the write target before the rename
///
/// Unique per write so concurrent writers of the same entry never share it.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

#[async_trait]
impl DiskBackend for TokioFsBackend {
    async fn entry_kind(&self, path: &Path) -> Result<EntryKind, DiskCacheError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => Ok(EntryKind::Directory),
            Ok(_) => Ok(EntryKind::File),
            // A plain file somewhere along the path also means nothing is here
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                Ok(EntryKind::Missing)
            }
            Err(e) => Err(DiskCacheError::at(path, e)),
        }
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| DiskCacheError::at(path, e))?;
        Ok(Bytes::from(data))
    }

    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }

        // Write to temp file
        let temp_path = temp_path_for(path);
        tokio::fs::write(&temp_path, &data)
            .await
            .map_err(|e| DiskCacheError::at(&temp_path, e))?;

        // Atomically rename
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(DiskCacheError::at(path, e));
        }

        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), DiskCacheError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| DiskCacheError::at(path, e))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), DiskCacheError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| DiskCacheError::at(path, e))
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<(), DiskCacheError> {
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|e| DiskCacheError::at(path, e))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), DiskCacheError> {
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| DiskCacheError::at(to, e))
    }
}
