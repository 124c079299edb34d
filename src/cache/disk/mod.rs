//! Disk-based response cache
//!
//! This module persists responses under a cache root, one entry per
//! canonical key, using two layouts:
//! - **simple**: a single file at the key's path (status 200, inferred type)
//! - **extended**: a directory at the key's path with `.dmp` and `.prp`
//!
//! Filesystem access goes through the `DiskBackend` trait; `TokioFsBackend`
//! is the portable implementation.

pub use self::backend::{DiskBackend, EntryKind};
pub use self::disk_cache::DiskCache;
pub use self::error::DiskCacheError;
pub use self::tokio_backend::TokioFsBackend;

pub mod backend;
mod disk_cache;
mod error;
pub mod tokio_backend;
