//! Error types for gateway operations

use folio_asset::{AssetId, ResourceKind};

/// Errors surfaced by a remote asset gateway
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Blob does not exist remotely
    #[error("{kind} blob not found: {id}")]
    NotFound { kind: ResourceKind, id: AssetId },

    /// Store refused the payload
    #[error("upload rejected: {0}")]
    Rejected(String),

    /// Transport failure
    #[error("network error: {message}")]
    Network { message: String, retryable: bool },

    /// Call exceeded its deadline
    #[error("gateway call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Local I/O failure (filesystem backend)
    #[error("i/o error for {path}: {message}")]
    Io { path: String, message: String },

    /// Identifier is malformed for this backend
    #[error("invalid asset id: {0}")]
    InvalidId(AssetId),
}

impl GatewayError {
    /// Check if the call may succeed when retried
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network { retryable, .. } => *retryable,
            GatewayError::Timeout { .. } => true,
            GatewayError::NotFound { .. }
            | GatewayError::Rejected(_)
            | GatewayError::Io { .. }
            | GatewayError::InvalidId(_) => false,
        }
    }

    /// Create I/O error for path
    pub fn io(path: impl Into<String>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }
}
