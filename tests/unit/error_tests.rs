// Error types unit tests

use restcache::backend::FetchError;
use restcache::cache::{CacheError, KeyError};
use restcache::error::ProxyError;
use std::error::Error;

#[test]
fn test_status_codes() {
    let bad_request: ProxyError = KeyError::InvalidSegment("..".to_string()).into();
    assert_eq!(bad_request.status_code(), 400);

    let backend: ProxyError = FetchError::Timeout {
        backend: "origin:80".to_string(),
    }
    .into();
    assert_eq!(backend.status_code(), 502);

    let cache: ProxyError = CacheError::corrupt("/a", "metadata present without body").into();
    assert_eq!(cache.status_code(), 500);

    assert_eq!(ProxyError::Internal("x".to_string()).status_code(), 500);
}

#[test]
fn test_display_includes_category() {
    let err = ProxyError::BadRequest("path is not valid UTF-8".to_string());
    assert_eq!(err.to_string(), "Bad request: path is not valid UTF-8");

    let err: ProxyError = FetchError::Unreachable {
        backend: "origin:80".to_string(),
        reason: "connection refused".to_string(),
    }
    .into();
    assert!(err.to_string().starts_with("Backend error: "));
    assert!(err.to_string().contains("origin:80"));
}

#[test]
fn test_source_chain() {
    let err: ProxyError = CacheError::corrupt("/a", "bad status").into();
    let source = err.source().expect("cache errors carry their source");
    assert!(source.to_string().contains("/a"));

    assert!(ProxyError::Internal("x".to_string()).source().is_none());
}

#[test]
fn test_corruption_is_recognisable() {
    assert!(CacheError::corrupt("/a", "x").is_corrupt());
    assert!(!CacheError::Configuration("x".to_string()).is_corrupt());
}
