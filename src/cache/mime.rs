//! Extension to MIME type table
//!
//! The table is injected into the cache store instead of living in global
//! state, so tests can run with their own type sets.

use std::collections::HashMap;

use crate::constants::DEFAULT_MIME_TYPE;

/// Read-only mapping of file extensions (with leading dot) to MIME types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTypes {
    by_extension: HashMap<String, String>,
}

impl MimeTypes {
    /// Empty table: every name resolves to the `unknown/unknown` sentinel
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Build a table from `(extension, type)` pairs
    ///
    /// Extensions may be given with or without the leading dot.
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        entries
            .into_iter()
            .fold(Self::empty(), |table, (ext, mime)| table.with(ext, mime))
    }

    /// Add or replace one mapping
    pub fn with(mut self, extension: impl AsRef<str>, mime_type: impl Into<String>) -> Self {
        self.by_extension
            .insert(normalize_extension(extension.as_ref()), mime_type.into());
        self
    }

    /// Type registered for an extension such as `.html`
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.by_extension.get(extension).map(String::as_str)
    }

    /// Infer the type of a file name from the text after its last dot
    ///
    /// Names without a dot or with an unregistered extension resolve to
    /// `unknown/unknown`.
    pub fn for_name(&self, name: &str) -> &str {
        name.rfind('.')
            .and_then(|dot| self.get(&name[dot..]))
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::from_map([
            (".js", "text/javascript"),
            (".html", "text/html"),
            (".htm", "text/html"),
            (".css", "text/css"),
            (".xml", "text/xml"),
            (".gif", "image/gif"),
            (".jpg", "image/jpeg"),
            (".png", "image/png"),
        ])
    }
}

fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}
