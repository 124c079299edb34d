//! Backend origin access
//!
//! A `Fetcher` performs exactly one request to the origin per call and
//! returns the fully buffered response. It never retries. When no origin is
//! configured it reports `FetchOutcome::NoBackend` instead of connecting,
//! which is how an offline, pre-populated cache is served.

use async_trait::async_trait;
use thiserror::Error;

use crate::cache::RawResponse;

pub mod http;

pub use self::http::HttpFetcher;

/// Errors from a single backend fetch
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("backend {backend} unreachable: {reason}")]
    Unreachable { backend: String, reason: String },

    #[error("backend {backend} timed out")]
    Timeout { backend: String },

    #[error("failed to read backend response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Result of a fetch attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(RawResponse),
    /// No backend configured; nothing was attempted
    NoBackend,
}

/// One inbound request cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Render cookies as a single `Cookie` header value: `a=b;c=d;`
///
/// Returns `None` when there are no cookies, so no header is sent.
pub fn cookie_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }

    let mut header = String::new();
    for cookie in cookies {
        header.push_str(&cookie.name);
        header.push('=');
        header.push_str(&cookie.value);
        header.push(';');
    }
    Some(header)
}

/// Parse an inbound `Cookie` header into ordered pairs
///
/// Pairs without `=` and empty names are ignored. Values are kept as sent.
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    cookie::Cookie::split_parse(header)
        .filter_map(Result::ok)
        .map(|parsed| Cookie::new(parsed.name(), parsed.value()))
        .collect()
}

/// Access to the origin server
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `target` (path plus canonical query) forwarding `cookies`
    async fn fetch(&self, target: &str, cookies: &[Cookie]) -> Result<FetchOutcome, FetchError>;
}
