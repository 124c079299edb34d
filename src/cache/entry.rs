//! Cached response types
//!
//! This module defines what a cache entry holds, independent of how it is laid
//! out on disk:
//! - `RawResponse`: response as received from the backend
//! - `StoredResponse`: tagged entry, `Simple` or `Extended`
//! - `ResponseMeta`: status, content type and cookies of an extended entry

use bytes::Bytes;

use super::error::CacheError;
use super::properties::Properties;
use crate::constants::{CONTENT_TYPE_PROPERTY, SET_COOKIE_PROPERTY, STATUS_PROPERTY};

/// Status of a response that can use the simple layout
pub const SIMPLE_STATUS: u16 = 200;

/// Response as returned by the backend, before it is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if the backend sent one
    pub content_type: Option<String>,
    /// `Set-Cookie` header values joined by `\n`, if any
    pub set_cookie: Option<String>,
    /// Fully buffered body
    pub body: Bytes,
}

/// Physical layout of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Single file; status 200 and content type implied by the extension
    Simple,
    /// Directory with a body file and a metadata file
    Extended,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Simple => "simple",
            Layout::Extended => "extended",
        }
    }
}

/// Metadata persisted next to the body of an extended entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub content_type: Option<String>,
    pub set_cookie: Option<String>,
}

impl ResponseMeta {
    /// Absent values are left out of the record rather than written empty
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.set(STATUS_PROPERTY, self.status.to_string());
        if let Some(content_type) = &self.content_type {
            props.set(CONTENT_TYPE_PROPERTY, content_type.clone());
        }
        if let Some(set_cookie) = &self.set_cookie {
            props.set(SET_COOKIE_PROPERTY, set_cookie.clone());
        }
        props
    }

    /// Read metadata back; a missing or non-numeric status is corruption
    pub fn from_properties(key: &str, props: &Properties) -> Result<Self, CacheError> {
        let status = props
            .get(STATUS_PROPERTY)
            .ok_or_else(|| CacheError::corrupt(key, "metadata has no status"))?;
        let status = status
            .trim()
            .parse::<u16>()
            .map_err(|_| CacheError::corrupt(key, format!("invalid status '{}'", status)))?;

        Ok(Self {
            status,
            content_type: props.get(CONTENT_TYPE_PROPERTY).map(str::to_string),
            set_cookie: props.get(SET_COOKIE_PROPERTY).map(str::to_string),
        })
    }
}

/// One cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredResponse {
    /// Status 200 with the content type inferred from the key's extension
    Simple { content_type: String, body: Bytes },
    /// Any other response
    Extended { meta: ResponseMeta, body: Bytes },
}

impl StoredResponse {
    /// Choose the layout for a backend response
    ///
    /// The simple layout is used only when it loses nothing: status 200, a
    /// content type whose base type equals `default_type`, and no cookies.
    /// `path_is_dir` forces the extended layout when deeper keys already
    /// occupy the entry's path as a directory.
    pub fn from_raw(raw: RawResponse, default_type: &str, path_is_dir: bool) -> Self {
        let simple = raw.status == SIMPLE_STATUS
            && raw.set_cookie.is_none()
            && !path_is_dir
            && raw
                .content_type
                .as_deref()
                .is_some_and(|content_type| base_type(content_type).eq_ignore_ascii_case(default_type));

        if simple {
            StoredResponse::Simple {
                content_type: default_type.to_string(),
                body: raw.body,
            }
        } else {
            StoredResponse::Extended {
                meta: ResponseMeta {
                    status: raw.status,
                    content_type: raw.content_type,
                    set_cookie: raw.set_cookie,
                },
                body: raw.body,
            }
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            StoredResponse::Simple { .. } => Layout::Simple,
            StoredResponse::Extended { .. } => Layout::Extended,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            StoredResponse::Simple { .. } => SIMPLE_STATUS,
            StoredResponse::Extended { meta, .. } => meta.status,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            StoredResponse::Simple { content_type, .. } => Some(content_type.as_str()),
            StoredResponse::Extended { meta, .. } => meta.content_type.as_deref(),
        }
    }

    pub fn body(&self) -> &Bytes {
        match self {
            StoredResponse::Simple { body, .. } | StoredResponse::Extended { body, .. } => body,
        }
    }

    /// Extra headers to replay on a hit, in stored order
    pub fn headers(&self) -> Vec<(String, String)> {
        match self {
            StoredResponse::Extended {
                meta:
                    ResponseMeta {
                        set_cookie: Some(set_cookie),
                        ..
                    },
                ..
            } => set_cookie
                .split('\n')
                .filter(|value| !value.is_empty())
                .map(|value| ("Set-Cookie".to_string(), value.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Media type without parameters: `text/html; charset=UTF-8` -> `text/html`
pub fn base_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}
