// Error types module

use std::fmt;

use crate::backend::FetchError;
use crate::cache::{CacheError, KeyError};

/// Centralized error type for the proxy
///
/// Categorizes errors by where they originate so each maps onto one HTTP
/// status code.
#[derive(Debug)]
pub enum ProxyError {
    /// Client sent something that cannot become a cache key
    BadRequest(String),

    /// Backend unreachable, timed out or the body could not be read
    Backend(FetchError),

    /// Cache entry unreadable, corrupt or not writable
    Cache(CacheError),

    /// Invariant violated inside the proxy (e.g. store did not commit)
    Internal(String),
}

impl ProxyError {
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::BadRequest(_) => 400,
            ProxyError::Backend(_) => 502,
            ProxyError::Cache(_) | ProxyError::Internal(_) => 500,
        }
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ProxyError::Backend(err) => write!(f, "Backend error: {}", err),
            ProxyError::Cache(err) => write!(f, "Cache error: {}", err),
            ProxyError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::Backend(err) => Some(err),
            ProxyError::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FetchError> for ProxyError {
    fn from(err: FetchError) -> Self {
        ProxyError::Backend(err)
    }
}

impl From<CacheError> for ProxyError {
    fn from(err: CacheError) -> Self {
        ProxyError::Cache(err)
    }
}

impl From<KeyError> for ProxyError {
    fn from(err: KeyError) -> Self {
        ProxyError::BadRequest(err.to_string())
    }
}
