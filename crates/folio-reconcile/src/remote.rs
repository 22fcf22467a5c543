//! Kinded asset references

use folio_asset::{AssetReference, ResourceKind};
use serde::Serialize;
use std::fmt;

/// A reference together with the remote namespace it lives in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteAsset {
    pub kind: ResourceKind,
    pub reference: AssetReference,
}

impl RemoteAsset {
    #[inline]
    #[must_use]
    pub fn new(kind: ResourceKind, reference: AssetReference) -> Self {
        Self { kind, reference }
    }

    #[inline]
    #[must_use]
    pub fn image(reference: AssetReference) -> Self {
        Self::new(ResourceKind::Image, reference)
    }

    #[inline]
    #[must_use]
    pub fn video(reference: AssetReference) -> Self {
        Self::new(ResourceKind::Video, reference)
    }
}

impl fmt::Display for RemoteAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.reference.id)
    }
}
