//! Per-call deadline wrapper

use crate::error::GatewayError;
use crate::gateway::AssetGateway;
use async_trait::async_trait;
use folio_asset::{AssetId, MediaPayload, ResourceKind, StoredBlob};
use std::future::Future;
use std::time::Duration;

/// Gateway decorator that fails calls exceeding `timeout`
///
/// A zero timeout disables the deadline.
#[derive(Debug, Clone)]
pub struct TimedGateway<G> {
    inner: G,
    timeout: Duration,
}

impl<G: AssetGateway> TimedGateway<G> {
    /// Wrap `inner`
    #[inline]
    #[must_use]
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Wrapped gateway
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &G {
        &self.inner
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>> + Send,
    {
        if self.timeout.is_zero() {
            return call.await;
        }
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                elapsed_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[async_trait]
impl<G: AssetGateway> AssetGateway for TimedGateway<G> {
    async fn upload(
        &self,
        payload: &MediaPayload,
        kind: ResourceKind,
    ) -> Result<StoredBlob, GatewayError> {
        self.bounded(self.inner.upload(payload, kind)).await
    }

    async fn delete(&self, id: &AssetId, kind: ResourceKind) -> Result<(), GatewayError> {
        self.bounded(self.inner.delete(id, kind)).await
    }

    async fn exists(&self, id: &AssetId, kind: ResourceKind) -> Result<bool, GatewayError> {
        self.bounded(self.inner.exists(id, kind)).await
    }
}
