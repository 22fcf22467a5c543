//! Error types for document persistence

use folio_asset::DocumentId;

/// Document store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No document with this id
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Stored version differs from the one the caller loaded
    #[error("version conflict on {id}: expected {expected:?}, found {actual:?}")]
    VersionConflict {
        id: DocumentId,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// Identifier cannot be mapped to a storage location
    #[error("invalid document id: {0}")]
    InvalidId(DocumentId),

    /// Encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend I/O failure
    #[error("i/o error for {path}: {message}")]
    Io { path: String, message: String },

    /// Backend unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if the save may succeed when retried unchanged
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io { .. })
    }

    /// Create I/O error for path
    pub fn io(path: impl Into<String>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
