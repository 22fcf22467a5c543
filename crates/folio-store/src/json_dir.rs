//! JSON directory store
//!
//! Each document is a pretty-printed JSON file `<dir>/<id>.json`. Writes go
//! through a temporary file and a rename so a reader never observes a
//! half-written document.

use crate::error::StoreError;
use crate::store::{check_version, sort_newest_first, DocumentStore};
use async_trait::async_trait;
use folio_asset::{Document, DocumentId};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Directory-backed document store
#[derive(Debug)]
pub struct JsonDirDocumentStore {
    dir: PathBuf,
    /// Serializes read-check-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonDirDocumentStore {
    /// Open (creating if needed) a store directory
    ///
    /// # Errors
    /// - `StoreError::Io` if the directory cannot be created
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(dir.display().to_string(), &e))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Store directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &DocumentId) -> Result<PathBuf, StoreError> {
        let raw = id.as_str();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.clone()));
        }
        Ok(self.dir.join(format!("{raw}.json")))
    }

    async fn read(&self, path: &Path) -> Result<Option<Document>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path.display().to_string(), &e)),
        }
    }
}

#[async_trait]
impl DocumentStore for JsonDirDocumentStore {
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let path = self.path_for(id)?;
        self.read(&path).await
    }

    async fn save(
        &self,
        document: &Document,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        let path = self.path_for(&document.id)?;
        let _guard = self.write_lock.lock().await;

        let current = self.read(&path).await?.map(|d| d.version);
        check_version(&document.id, expected_version, current)?;

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::io(tmp.display().to_string(), &e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(path.display().to_string(), &e))?;

        tracing::debug!(document_id = %document.id, version = document.version, "document saved");
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(StoreError::io(path.display().to_string(), &e)),
        }
    }

    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        let dir_error = |e: std::io::Error| StoreError::io(self.dir.display().to_string(), &e);
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(dir_error)?;

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
            let path = entry.path();
            // Skips in-flight `.json.tmp` writes as well.
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // A file removed since the directory was read is simply gone.
            if let Some(document) = self.read(&path).await? {
                documents.push(document);
            }
        }

        sort_newest_first(&mut documents);
        tracing::debug!(count = documents.len(), "documents listed");
        Ok(documents)
    }
}
