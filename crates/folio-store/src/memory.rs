//! In-memory document store

use crate::error::StoreError;
use crate::store::{check_version, sort_newest_first, DocumentStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use folio_asset::{Document, DocumentId};

/// Concurrent map of documents
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<DocumentId, Document>,
}

impl MemoryDocumentStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, bypassing the version check
    pub fn insert(&self, document: Document) {
        self.documents.insert(document.id.clone(), document);
    }

    /// Snapshot of a stored document
    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.documents.get(id).map(|d| d.value().clone())
    }

    /// Number of stored documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.get(id))
    }

    async fn save(
        &self,
        document: &Document,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        match self.documents.entry(document.id.clone()) {
            Entry::Occupied(mut entry) => {
                check_version(&document.id, expected_version, Some(entry.get().version))?;
                entry.insert(document.clone());
            }
            Entry::Vacant(entry) => {
                check_version(&document.id, expected_version, None)?;
                entry.insert(document.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        self.documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        let mut documents: Vec<Document> =
            self.documents.iter().map(|d| d.value().clone()).collect();
        sort_newest_first(&mut documents);
        Ok(documents)
    }
}
