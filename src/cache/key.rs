//! Canonical cache keys
//!
//! A request is addressed in the cache by its target path followed by its
//! query parameters, sorted by name:
//! - `QueryParams`: ordered multimap of parameter name to values
//! - `canonicalize`: pure function building the canonical string
//! - `CacheKey`: validated canonical key that knows its on-disk location

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::{BODY_FILE_NAME, META_FILE_NAME};

/// Errors raised while deriving a cache key from a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("query component is not valid UTF-8 after decoding: {0}")]
    InvalidEncoding(String),

    #[error("path segment '{0}' is not allowed in a cache key")]
    InvalidSegment(String),
}

/// Query parameters of a request
///
/// Names are kept sorted (byte-wise, so case-sensitive); the values of one
/// name keep the order in which they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `name`
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    /// Parse an `application/x-www-form-urlencoded` query string
    ///
    /// `+` decodes to a space and percent escapes are resolved. A pair
    /// without `=` yields an empty value. Empty pairs (`a=1&&b=2`) are skipped.
    pub fn from_query_string(raw: &str) -> Result<Self, KeyError> {
        let mut params = Self::new();
        for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.add(decode_component(name)?, decode_component(value)?);
        }
        Ok(params)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of distinct parameter names
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.params.get(name).map(Vec::as_slice)
    }

    /// Iterate names in sorted order together with their values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.add(name, value);
        }
        params
    }
}

fn decode_component(raw: &str) -> Result<String, KeyError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| KeyError::InvalidEncoding(raw.to_string()))
}

/// Build the canonical key string for a target and its parameters
///
/// With no parameters the target is returned unchanged. Otherwise every
/// `name=value` pair is appended, names in sorted order and values in their
/// original order, the first pair after `?` and the rest after `&`. Values
/// are percent-encoded; names are taken as they are.
pub fn canonicalize(target: &str, params: &QueryParams) -> String {
    let mut key = String::with_capacity(target.len() + 16 * params.len());
    key.push_str(target);

    let mut first = true;
    for (name, values) in params.iter() {
        for value in values {
            key.push(if first { '?' } else { '&' });
            first = false;
            key.push_str(name);
            key.push('=');
            key.push_str(&urlencoding::encode(value));
        }
    }

    key
}

/// Canonical address of one cached response
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    canonical: String,
}

impl CacheKey {
    /// Canonicalize a request target and validate the resulting path
    pub fn new(target: &str, params: &QueryParams) -> Result<Self, KeyError> {
        Self::from_canonical(canonicalize(target, params))
    }

    /// Wrap an already canonical string
    ///
    /// Rejects `.` and `..` segments, which would escape the entry's place in
    /// the cache tree, and segments that collide with the extended layout's
    /// own file names.
    pub fn from_canonical(canonical: impl Into<String>) -> Result<Self, KeyError> {
        let canonical = canonical.into();
        for segment in segments(&canonical) {
            if matches!(segment, "." | ".." | BODY_FILE_NAME | META_FILE_NAME) {
                return Err(KeyError::InvalidSegment(segment.to_string()));
            }
        }
        Ok(Self { canonical })
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Non-empty `/`-separated segments of the key
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        segments(&self.canonical)
    }

    /// Last segment, used for extension-based content type inference
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Location of the entry relative to the cache root
    ///
    /// Keys sharing a path prefix share directories, mirroring the origin's
    /// URL hierarchy.
    pub fn relative_path(&self) -> PathBuf {
        self.segments().collect()
    }

    /// Location of the entry under `root`
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

fn segments(canonical: &str) -> impl Iterator<Item = &str> {
    canonical.split('/').filter(|segment| !segment.is_empty())
}
