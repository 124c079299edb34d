//! Response cache
//!
//! - `key`: canonical request keys
//! - `mime`: injected extension to MIME type table
//! - `entry`: in-memory entry representation and layout choice
//! - `properties`: metadata text codec
//! - `disk`: persistent store

pub mod disk;
pub mod entry;
pub mod error;
pub mod key;
pub mod mime;
pub mod properties;
pub mod traits;

pub use disk::DiskCache;
pub use entry::{Layout, RawResponse, ResponseMeta, StoredResponse};
pub use error::CacheError;
pub use key::{canonicalize, CacheKey, KeyError, QueryParams};
pub use mime::MimeTypes;
pub use traits::ResponseStore;
