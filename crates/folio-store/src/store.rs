//! Store trait

use crate::error::StoreError;
use async_trait::async_trait;
use folio_asset::{Document, DocumentId};
use std::sync::Arc;

/// Whole-document persistence
///
/// No partial-field save semantics: `save` replaces the stored document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    /// Replace (or insert) a document
    ///
    /// `expected_version` is the version the caller loaded, or `None` when
    /// inserting a new document.
    ///
    /// # Errors
    /// - `StoreError::VersionConflict` if the stored version differs
    async fn save(&self, document: &Document, expected_version: Option<u64>)
        -> Result<(), StoreError>;

    /// Permanently remove a document
    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError>;

    /// Every stored document, newest first
    async fn list(&self) -> Result<Vec<Document>, StoreError>;
}

/// Process-scoped store handle
pub type SharedStore = Arc<dyn DocumentStore>;

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn save(
        &self,
        document: &Document,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        (**self).save(document, expected_version).await
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        (**self).list().await
    }
}

/// Order documents by creation time, newest first, ties by id
pub(crate) fn sort_newest_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
}

/// Compare the stored version against the caller's expectation
///
/// # Errors
/// - `StoreError::VersionConflict` on mismatch
pub fn check_version(
    id: &DocumentId,
    expected: Option<u64>,
    actual: Option<u64>,
) -> Result<(), StoreError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StoreError::VersionConflict {
            id: id.clone(),
            expected,
            actual,
        })
    }
}
