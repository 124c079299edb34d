//! Backend trait for filesystem operations

use super::error::DiskCacheError;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

/// What occupies a path in the cache tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    File,
    Directory,
}

/// Abstraction over filesystem operations used by the disk store
#[async_trait]
pub trait DiskBackend: Send + Sync {
    /// Classify what occupies the path (symlinks are followed)
    async fn entry_kind(&self, path: &Path) -> Result<EntryKind, DiskCacheError>;

    /// Read entire file contents
    async fn read_file(&self, path: &Path) -> Result<Bytes, DiskCacheError>;

    /// Write file contents atomically (temp file + rename), creating parents
    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), DiskCacheError>;

    /// Create directory and all parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Delete a plain file
    async fn remove_file(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Delete a directory and everything below it
    async fn remove_dir_all(&self, path: &Path) -> Result<(), DiskCacheError>;

    /// Move `from` to `to` in one step
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), DiskCacheError>;
}
