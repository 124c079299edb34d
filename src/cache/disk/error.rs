//! Error types for disk cache operations

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiskCacheError {
    #[error("I/O error at {}: {source}", .path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DiskCacheError {
    /// Attach the path an I/O error occurred at
    pub fn at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DiskCacheError::Path {
            path: path.into(),
            source,
        }
    }
}
