//! Asset references
//!
//! An [`AssetReference`] is the only way a document points at a remote blob.
//! References are minted from a [`StoredBlob`] returned by a successful upload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a remote blob
///
/// Opaque to the engine; unique within the remote store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wrap a store identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of remote resource
///
/// Images and videos live in separate remote namespaces and are deleted
/// through kind-specific calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Still image
    Image,
    /// Video clip
    Video,
}

impl ResourceKind {
    /// Lowercase name, used for metric labels and folder names
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful upload: the identity of a blob now present remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    /// Store-assigned identifier
    pub id: AssetId,
    /// Resolvable location derived from `id`
    pub url: String,
}

impl StoredBlob {
    /// Create new stored blob
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<AssetId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Reference from a document to one remote blob
///
/// # Invariants
/// - A reference held by a persisted document corresponds to a blob present
///   in the remote store (the reconciliation coordinator is the only writer).
///
/// Serialized with the `public_id` key; `id` is accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReference {
    /// Remote store identifier
    #[serde(rename = "public_id", alias = "id")]
    pub id: AssetId,
    /// Resolvable location (not authoritative)
    #[serde(default)]
    pub url: String,
    /// Document-owned caption
    #[serde(default)]
    pub caption: String,
}

impl AssetReference {
    /// Create a reference with an empty caption
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<AssetId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            caption: String::new(),
        }
    }

    /// Mint a reference from an upload result
    #[inline]
    #[must_use]
    pub fn from_blob(blob: StoredBlob, caption: impl Into<String>) -> Self {
        Self {
            id: blob.id,
            url: blob.url,
            caption: caption.into(),
        }
    }

    /// With caption
    #[inline]
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

/// Ordered image references in display order
pub type ImageAssetList = Vec<AssetReference>;

/// At most one video reference
pub type VideoSlot = Option<AssetReference>;
