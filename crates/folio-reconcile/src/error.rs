//! Error types for reconciliation
//!
//! Provides the failure/success contract of the engine:
//! - Validation failures (bad form input, unknown document)
//! - Upload failures (fatal, rolled back before returning)
//! - Deletion failures (non-fatal, surfaced as [`ReconcileWarning`])
//! - Persist failures (fatal, uploads reported as orphan candidates)

use crate::phase::PhaseError;
use crate::remote::RemoteAsset;
use folio_asset::{AssetReference, DocumentId, ResourceKind};
use folio_gateway::GatewayError;
use folio_store::StoreError;
use std::fmt;

/// Form input rejected by the normalizer
///
/// `field` is always the exact form-field name so the caller can correct a
/// single input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Field present but unparseable or out of range
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Required field absent or blank
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Create invalid field error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Offending field name
    #[inline]
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidField { field, .. } | Self::MissingField(field) => field,
        }
    }
}

/// Position of a failed upload within its batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSlot {
    /// Image at this index of the new-image list
    Image(usize),
    /// The replacement video
    Video,
}

impl fmt::Display for UploadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadSlot::Image(index) => write!(f, "image #{index}"),
            UploadSlot::Video => f.write_str("video"),
        }
    }
}

/// Fatal reconciliation error
///
/// Every variant is returned without the document store having been
/// mutated, except `PersistFailed` where the store rejected the commit.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Form input rejected
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Target document does not exist
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Loading the document failed
    #[error("failed to load document: {0}")]
    LoadFailed(#[source] StoreError),

    /// An upload failed; successful siblings were rolled back
    #[error("upload of {slot} failed: {cause}")]
    AssetUploadFailed {
        slot: UploadSlot,
        #[source]
        cause: GatewayError,
    },

    /// The store rejected the commit
    #[error("persist failed: {cause}")]
    PersistFailed {
        #[source]
        cause: StoreError,
        /// Blobs uploaded for this reconciliation that no document references
        orphaned: Vec<RemoteAsset>,
    },

    /// Internal sequencing error
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// The upload task was torn down before reporting
    #[error("reconciliation cancelled")]
    Cancelled,
}

impl ReconcileError {
    /// Check if this is a caller input error
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if the same request may succeed when retried
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AssetUploadFailed { cause, .. } => cause.is_retryable(),
            Self::PersistFailed { cause, .. } | Self::LoadFailed(cause) => {
                cause.is_retryable() || matches!(cause, StoreError::VersionConflict { .. })
            }
            Self::Validation(_) | Self::NotFound(_) | Self::Phase(_) | Self::Cancelled => false,
        }
    }

    /// HTTP status a transport layer would map this error to
    #[inline]
    #[must_use]
    pub fn http_status_hint(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::AssetUploadFailed { .. } => 502,
            Self::PersistFailed {
                cause: StoreError::VersionConflict { .. },
                ..
            } => 409,
            Self::LoadFailed(_) | Self::PersistFailed { .. } | Self::Phase(_) | Self::Cancelled => {
                500
            }
        }
    }

    /// Stable label for metrics
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::LoadFailed(_) => "load",
            Self::AssetUploadFailed { .. } => "upload",
            Self::PersistFailed { .. } => "persist",
            Self::Phase(_) => "phase",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Non-fatal outcome reported alongside a successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileWarning {
    /// A discarded blob could not be deleted and is now an orphan
    #[error("failed to delete {kind} {}: {cause}", reference.id)]
    AssetDeletionFailed {
        kind: ResourceKind,
        reference: AssetReference,
        cause: GatewayError,
    },

    /// A kept reference points at a blob that no longer exists remotely
    #[error("kept {kind} {} is missing from the remote store", reference.id)]
    DanglingReference {
        kind: ResourceKind,
        reference: AssetReference,
    },
}

impl ReconcileWarning {
    /// Referenced asset
    #[inline]
    #[must_use]
    pub fn reference(&self) -> &AssetReference {
        match self {
            Self::AssetDeletionFailed { reference, .. } | Self::DanglingReference { reference, .. } => {
                reference
            }
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_field() {
        let err = ValidationError::invalid("existingImages", "expected a JSON array");
        assert_eq!(err.field(), "existingImages");
        assert!(err.to_string().contains("existingImages"));
        assert_eq!(ValidationError::MissingField("title").field(), "title");
    }

    #[test]
    fn status_hints() {
        let validation = ReconcileError::from(ValidationError::MissingField("title"));
        assert_eq!(validation.http_status_hint(), 400);
        assert!(validation.is_validation());

        let upload = ReconcileError::AssetUploadFailed {
            slot: UploadSlot::Image(1),
            cause: GatewayError::Rejected("nope".into()),
        };
        assert_eq!(upload.http_status_hint(), 502);
        assert!(upload.to_string().contains("image #1"));

        let persist = ReconcileError::PersistFailed {
            cause: StoreError::Unavailable("down".into()),
            orphaned: vec![],
        };
        assert_eq!(persist.http_status_hint(), 500);
        assert!(persist.is_retryable());
    }

    #[test]
    fn version_conflict_maps_to_409() {
        let err = ReconcileError::PersistFailed {
            cause: StoreError::VersionConflict {
                id: DocumentId::from("d"),
                expected: Some(1),
                actual: Some(2),
            },
            orphaned: vec![],
        };
        assert_eq!(err.http_status_hint(), 409);
        assert!(err.is_retryable());
    }

    #[test]
    fn warning_display() {
        let warning = ReconcileWarning::AssetDeletionFailed {
            kind: ResourceKind::Image,
            reference: AssetReference::new("i1", ""),
            cause: GatewayError::Timeout { elapsed_ms: 5 },
        };
        assert!(warning.to_string().starts_with("failed to delete image i1"));
        assert_eq!(warning.reference().id.as_str(), "i1");
    }
}
