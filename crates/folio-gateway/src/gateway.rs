//! Gateway trait

use crate::error::GatewayError;
use async_trait::async_trait;
use folio_asset::{AssetId, MediaPayload, ResourceKind, StoredBlob};
use std::sync::Arc;

/// Remote object store operations
///
/// Implementations must be safe to share across concurrent orchestration
/// calls. Timeouts are the implementation's concern and surface as ordinary
/// errors.
#[async_trait]
pub trait AssetGateway: Send + Sync {
    /// Store bytes and return the store-assigned identity
    async fn upload(
        &self,
        payload: &MediaPayload,
        kind: ResourceKind,
    ) -> Result<StoredBlob, GatewayError>;

    /// Remove a stored blob
    async fn delete(&self, id: &AssetId, kind: ResourceKind) -> Result<(), GatewayError>;

    /// Check whether a blob is still present
    async fn exists(&self, id: &AssetId, kind: ResourceKind) -> Result<bool, GatewayError>;
}

/// Process-scoped gateway handle
pub type SharedGateway = Arc<dyn AssetGateway>;

#[async_trait]
impl<G: AssetGateway + ?Sized> AssetGateway for Arc<G> {
    async fn upload(
        &self,
        payload: &MediaPayload,
        kind: ResourceKind,
    ) -> Result<StoredBlob, GatewayError> {
        (**self).upload(payload, kind).await
    }

    async fn delete(&self, id: &AssetId, kind: ResourceKind) -> Result<(), GatewayError> {
        (**self).delete(id, kind).await
    }

    async fn exists(&self, id: &AssetId, kind: ResourceKind) -> Result<bool, GatewayError> {
        (**self).exists(id, kind).await
    }
}
