//! Cache configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cache::MimeTypes;

fn default_coalesce_fetches() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache root directory (mandatory)
    #[serde(default)]
    pub dir: String,
    /// Serialize backend fetches per key so concurrent misses fetch once
    #[serde(default = "default_coalesce_fetches")]
    pub coalesce_fetches: bool,
    /// Extra extension -> MIME type entries on top of the built-in table
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mime_types: BTreeMap<String, String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            coalesce_fetches: default_coalesce_fetches(),
            mime_types: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Built-in MIME table extended with the configured entries
    pub fn mime_table(&self) -> MimeTypes {
        self.mime_types
            .iter()
            .fold(MimeTypes::default(), |table, (ext, mime)| {
                table.with(ext, mime.clone())
            })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.dir.trim().is_empty() {
            return Err("cache.dir is required".to_string());
        }
        for (ext, mime) in &self.mime_types {
            if ext.trim_start_matches('.').is_empty() || mime.trim().is_empty() {
                return Err(format!(
                    "cache.mime_types entry '{}: {}' is incomplete",
                    ext, mime
                ));
            }
        }
        Ok(())
    }
}
