//! Cache trait definition
//!
//! `ResponseStore` is the seam between the proxy loop and persistent storage.
//! Entries are created once and never updated or deleted through it.

use async_trait::async_trait;

use super::entry::{Layout, RawResponse, StoredResponse};
use super::error::CacheError;
use super::key::CacheKey;

#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Look up the committed entry for a key
    ///
    /// Returns `Ok(None)` when nothing is stored and `CacheError::Corrupt`
    /// when something is stored but is not a complete entry.
    async fn lookup(&self, key: &CacheKey) -> Result<Option<StoredResponse>, CacheError>;

    /// Persist a backend response and report the layout used
    async fn store(&self, key: &CacheKey, response: RawResponse) -> Result<Layout, CacheError>;
}
