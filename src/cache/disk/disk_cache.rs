//! Main DiskCache implementation
//!
//! Every canonical key maps to a path under the cache root. The entry at that
//! path is either a plain file (simple layout) or a directory holding `.dmp`
//! (body) and `.prp` (metadata). The metadata file is written last and acts
//! as the commit marker of an extended entry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::backend::{DiskBackend, EntryKind};
use super::tokio_backend::TokioFsBackend;
use crate::cache::entry::{Layout, RawResponse, ResponseMeta, StoredResponse};
use crate::cache::error::CacheError;
use crate::cache::key::CacheKey;
use crate::cache::mime::MimeTypes;
use crate::cache::properties::Properties;
use crate::cache::traits::ResponseStore;
use crate::constants::{BODY_FILE_NAME, DEFAULT_MIME_TYPE, META_FILE_NAME};

const META_COMMENT: &str = "generated by restcache";

/// Disk-based response store
pub struct DiskCache {
    root: PathBuf,
    mime_types: Arc<MimeTypes>,
    backend: Arc<dyn DiskBackend>,
}

impl DiskCache {
    /// Open (creating if needed) a cache rooted at `root`
    pub async fn open(
        root: impl Into<PathBuf>,
        mime_types: Arc<MimeTypes>,
    ) -> Result<Self, CacheError> {
        Self::with_backend(root, mime_types, Arc::new(TokioFsBackend::new())).await
    }

    /// Open a cache on a specific filesystem backend
    pub async fn with_backend(
        root: impl Into<PathBuf>,
        mime_types: Arc<MimeTypes>,
        backend: Arc<dyn DiskBackend>,
    ) -> Result<Self, CacheError> {
        let root = root.into();

        match backend.entry_kind(&root).await? {
            EntryKind::Directory => {}
            EntryKind::File => {
                return Err(CacheError::Configuration(format!(
                    "cache root {} is not a directory",
                    root.display()
                )))
            }
            EntryKind::Missing => backend.create_dir_all(&root).await.map_err(|e| {
                CacheError::Configuration(format!(
                    "cannot create cache root {}: {}",
                    root.display(),
                    e
                ))
            })?,
        }

        tracing::debug!(root = %root.display(), mime_types = mime_types.len(), "Disk cache opened");

        Ok(Self {
            root,
            mime_types,
            backend,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for `key`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        key.path_under(&self.root)
    }

    /// Content type implied by the key's last segment
    pub fn default_content_type(&self, key: &CacheKey) -> &str {
        key.file_name()
            .map(|name| self.mime_types.for_name(name))
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    async fn read_extended(
        &self,
        key: &CacheKey,
        dir: &Path,
    ) -> Result<Option<StoredResponse>, CacheError> {
        let meta_path = dir.join(META_FILE_NAME);
        let body_path = dir.join(BODY_FILE_NAME);
        let has_meta = self.backend.entry_kind(&meta_path).await? == EntryKind::File;
        let has_body = self.backend.entry_kind(&body_path).await? == EntryKind::File;

        match (has_meta, has_body) {
            // Only an intermediate directory of deeper keys
            (false, false) => Ok(None),
            (false, true) => Err(CacheError::corrupt(
                key.as_str(),
                "body present without metadata",
            )),
            (true, false) => Err(CacheError::corrupt(
                key.as_str(),
                "metadata present without body",
            )),
            (true, true) => {
                let raw_meta = self.backend.read_file(&meta_path).await?;
                let text = std::str::from_utf8(&raw_meta)
                    .map_err(|_| CacheError::corrupt(key.as_str(), "metadata is not UTF-8"))?;
                let props = Properties::parse(text)
                    .map_err(|e| CacheError::corrupt(key.as_str(), e.to_string()))?;
                let meta = ResponseMeta::from_properties(key.as_str(), &props)?;
                let body = self.backend.read_file(&body_path).await?;

                Ok(Some(StoredResponse::Extended { meta, body }))
            }
        }
    }

    /// Write an extended entry into `dir`, body first and metadata last
    async fn write_extended(
        &self,
        dir: &Path,
        meta: &ResponseMeta,
        body: Bytes,
    ) -> Result<(), CacheError> {
        self.backend.create_dir_all(dir).await?;
        self.backend
            .write_file_atomic(&dir.join(BODY_FILE_NAME), body)
            .await?;
        let text = meta.to_properties().to_text(Some(META_COMMENT));
        self.backend
            .write_file_atomic(&dir.join(META_FILE_NAME), text.into())
            .await?;
        Ok(())
    }

    /// Turn simple entries above `key` into extended ones
    ///
    /// A plain file cannot hold deeper keys, so each simple entry on the way
    /// down is rebuilt as a directory with the same body and inferred type.
    async fn promote_ancestors(&self, key: &CacheKey) -> Result<(), CacheError> {
        let segments: Vec<&str> = key.segments().collect();
        let mut ancestor = self.root.clone();

        for segment in &segments[..segments.len().saturating_sub(1)] {
            ancestor.push(segment);
            match self.backend.entry_kind(&ancestor).await? {
                EntryKind::Directory => {}
                EntryKind::File => self.promote(&ancestor, segment).await?,
                // Nothing deeper can exist either
                EntryKind::Missing => break,
            }
        }
        Ok(())
    }

    /// Replace the simple entry at `path` with an equivalent extended one
    ///
    /// The directory is assembled under a hidden sibling name and renamed into
    /// place, so readers see the old file, nothing, or the committed entry.
    async fn promote(&self, path: &Path, name: &str) -> Result<(), CacheError> {
        let body = self.backend.read_file(path).await?;
        let meta = ResponseMeta {
            status: 200,
            content_type: Some(self.mime_types.for_name(name).to_string()),
            set_cookie: None,
        };
        let staging = path.with_file_name(format!(
            ".{}.{}.promote",
            name,
            uuid::Uuid::new_v4().simple()
        ));
        self.write_extended(&staging, &meta, body).await?;

        if let Err(e) = self.backend.remove_file(path).await {
            if self.backend.entry_kind(path).await? == EntryKind::File {
                let _ = self.backend.remove_dir_all(&staging).await;
                return Err(e.into());
            }
        }

        if let Err(e) = self.backend.rename(&staging, path).await {
            let _ = self.backend.remove_dir_all(&staging).await;
            // Another store promoted the same entry first
            if self.backend.entry_kind(path).await? != EntryKind::Directory {
                return Err(e.into());
            }
        }

        tracing::debug!(path = %path.display(), "Simple entry promoted to extended layout");
        Ok(())
    }
}

#[async_trait]
impl ResponseStore for DiskCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<StoredResponse>, CacheError> {
        let path = self.entry_path(key);

        match self.backend.entry_kind(&path).await? {
            EntryKind::Missing => Ok(None),
            EntryKind::File => {
                let body = self.backend.read_file(&path).await?;
                Ok(Some(StoredResponse::Simple {
                    content_type: self.default_content_type(key).to_string(),
                    body,
                }))
            }
            EntryKind::Directory => self.read_extended(key, &path).await,
        }
    }

    async fn store(&self, key: &CacheKey, response: RawResponse) -> Result<Layout, CacheError> {
        self.promote_ancestors(key).await?;

        let path = self.entry_path(key);
        let path_is_dir = self.backend.entry_kind(&path).await? == EntryKind::Directory;
        let stored = StoredResponse::from_raw(response, self.default_content_type(key), path_is_dir);
        let layout = stored.layout();

        match stored {
            StoredResponse::Simple { body, .. } => {
                self.backend.write_file_atomic(&path, body).await?;
            }
            StoredResponse::Extended { meta, body } => {
                self.write_extended(&path, &meta, body).await?;
            }
        }

        tracing::debug!(key = %key, layout = layout.as_str(), path = %path.display(), "Cache entry stored");

        Ok(layout)
    }
}
