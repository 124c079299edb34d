//! Cache error types
//!
//! This module defines error types for cache operations.

use super::disk::DiskCacheError;

/// Cache error types
#[derive(Debug)]
pub enum CacheError {
    /// Cache root unusable (not a directory, cannot be created)
    Configuration(String),
    /// Entry exists but cannot be a committed entry (half-written or tampered)
    Corrupt { key: String, reason: String },
    /// Filesystem failure
    Disk(DiskCacheError),
}

impl CacheError {
    pub fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        CacheError::Corrupt {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, CacheError::Corrupt { .. })
    }
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Configuration(msg) => write!(f, "Cache configuration error: {}", msg),
            CacheError::Corrupt { key, reason } => {
                write!(f, "Corrupt cache entry '{}': {}", key, reason)
            }
            CacheError::Disk(err) => write!(f, "Disk cache error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Disk(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DiskCacheError> for CacheError {
    fn from(err: DiskCacheError) -> Self {
        CacheError::Disk(err)
    }
}
