//! Fault-injecting gateway

use async_trait::async_trait;
use folio_asset::{AssetId, MediaPayload, ResourceKind, StoredBlob};
use folio_gateway::{AssetGateway, GatewayError, MemoryGateway};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Message carried by every injected failure
pub const INJECTED_FAILURE: &str = "injected failure";

/// Gateway wrapper that fails or delays selected calls
///
/// Uploads are matched by payload filename, deletions by asset id, so a test
/// does not depend on the order in which concurrent calls arrive. Calls that
/// are not failed are forwarded to an inner [`MemoryGateway`], whose call log
/// then holds exactly the remote mutations that took effect.
#[derive(Debug, Default)]
pub struct FaultyGateway {
    inner: Arc<MemoryGateway>,
    failing_uploads: HashSet<String>,
    failing_deletes: HashSet<AssetId>,
    fail_every_delete: bool,
    upload_delays: HashMap<String, Duration>,
    upload_attempts: AtomicUsize,
    failed: Mutex<Vec<String>>,
}

impl FaultyGateway {
    /// Wrap a fresh memory gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing memory gateway
    pub fn wrapping(inner: Arc<MemoryGateway>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail uploads of the payload named `filename`
    pub fn fail_upload(mut self, filename: &str) -> Self {
        self.failing_uploads.insert(filename.to_string());
        self
    }

    /// Fail deletion of `id`
    pub fn fail_delete(mut self, id: &str) -> Self {
        self.failing_deletes.insert(id.into());
        self
    }

    /// Fail every deletion, whatever the id
    ///
    /// Reaches rollback paths, where uploaded ids are not known up front.
    pub fn fail_all_deletes(mut self) -> Self {
        self.fail_every_delete = true;
        self
    }

    /// Sleep before handling the upload of `filename`
    pub fn delay_upload(mut self, filename: &str, delay: Duration) -> Self {
        self.upload_delays.insert(filename.to_string(), delay);
        self
    }

    /// Backing memory gateway
    pub fn inner(&self) -> &Arc<MemoryGateway> {
        &self.inner
    }

    /// Upload calls received, failed ones included
    pub fn upload_attempts(&self) -> usize {
        self.upload_attempts.load(Ordering::SeqCst)
    }

    /// Descriptions of the calls that were failed on purpose
    pub fn injected_failures(&self) -> Vec<String> {
        self.failed.lock().clone()
    }

    fn injected(&self, what: String) -> GatewayError {
        self.failed.lock().push(what.clone());
        GatewayError::Network {
            message: format!("{INJECTED_FAILURE}: {what}"),
            retryable: false,
        }
    }
}

#[async_trait]
impl AssetGateway for FaultyGateway {
    async fn upload(
        &self,
        payload: &MediaPayload,
        kind: ResourceKind,
    ) -> Result<StoredBlob, GatewayError> {
        self.upload_attempts.fetch_add(1, Ordering::SeqCst);
        let name = payload.filename.clone().unwrap_or_default();

        if let Some(delay) = self.upload_delays.get(&name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_uploads.contains(&name) {
            return Err(self.injected(format!("upload {name}")));
        }
        self.inner.upload(payload, kind).await
    }

    async fn delete(&self, id: &AssetId, kind: ResourceKind) -> Result<(), GatewayError> {
        if self.fail_every_delete || self.failing_deletes.contains(id) {
            return Err(self.injected(format!("delete {id}")));
        }
        self.inner.delete(id, kind).await
    }

    async fn exists(&self, id: &AssetId, kind: ResourceKind) -> Result<bool, GatewayError> {
        self.inner.exists(id, kind).await
    }
}
