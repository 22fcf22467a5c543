//! In-memory gateway
//!
//! Keeps blobs in a concurrent map and records every call, so callers can
//! audit exactly which remote mutations a reconciliation performed.

use crate::error::GatewayError;
use crate::gateway::AssetGateway;
use async_trait::async_trait;
use dashmap::DashMap;
use folio_asset::{AssetId, MediaPayload, ResourceKind, StoredBlob};
use parking_lot::Mutex;
use ulid::Ulid;

/// Default public base URL for minted references
pub const DEFAULT_BASE_URL: &str = "memory://folio";

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// Upload that produced `id`
    Upload { kind: ResourceKind, id: AssetId, len: usize },
    /// Delete attempt (recorded whether or not the blob existed)
    Delete { kind: ResourceKind, id: AssetId },
    /// Existence probe
    Exists { kind: ResourceKind, id: AssetId },
}

/// In-process blob store
#[derive(Debug)]
pub struct MemoryGateway {
    base_url: String,
    /// Stored blobs and their byte length
    blobs: DashMap<(ResourceKind, AssetId), usize>,
    /// Call log in arrival order
    calls: Mutex<Vec<GatewayCall>>,
}

impl MemoryGateway {
    /// Create empty gateway
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create empty gateway minting urls under `base_url`
    #[inline]
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Seed a blob without recording a call
    pub fn insert(&self, kind: ResourceKind, id: impl Into<AssetId>) {
        self.blobs.insert((kind, id.into()), 0);
    }

    /// Whether a blob is present
    #[must_use]
    pub fn contains(&self, kind: ResourceKind, id: &AssetId) -> bool {
        self.blobs.contains_key(&(kind, id.clone()))
    }

    /// Number of stored blobs of `kind`
    #[must_use]
    pub fn blob_count(&self, kind: ResourceKind) -> usize {
        self.blobs.iter().filter(|e| e.key().0 == kind).count()
    }

    /// Url for an id
    #[must_use]
    pub fn url_for(&self, id: &AssetId) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Snapshot of the call log
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    /// Ids uploaded so far, in completion order
    #[must_use]
    pub fn uploaded_ids(&self) -> Vec<AssetId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::Upload { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Ids passed to `delete`, in call order
    #[must_use]
    pub fn deleted_ids(&self) -> Vec<AssetId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::Delete { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls, keep blobs
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetGateway for MemoryGateway {
    async fn upload(
        &self,
        payload: &MediaPayload,
        kind: ResourceKind,
    ) -> Result<StoredBlob, GatewayError> {
        let folder = match kind {
            ResourceKind::Image => "images",
            ResourceKind::Video => "videos",
        };
        let id = AssetId::new(format!(
            "blogs/{folder}/{}",
            Ulid::new().to_string().to_lowercase()
        ));
        self.blobs.insert((kind, id.clone()), payload.len());
        self.record(GatewayCall::Upload {
            kind,
            id: id.clone(),
            len: payload.len(),
        });
        tracing::trace!(%id, %kind, len = payload.len(), "memory upload");

        let url = self.url_for(&id);
        Ok(StoredBlob::new(id, url))
    }

    async fn delete(&self, id: &AssetId, kind: ResourceKind) -> Result<(), GatewayError> {
        self.record(GatewayCall::Delete {
            kind,
            id: id.clone(),
        });
        match self.blobs.remove(&(kind, id.clone())) {
            Some(_) => Ok(()),
            None => Err(GatewayError::NotFound {
                kind,
                id: id.clone(),
            }),
        }
    }

    async fn exists(&self, id: &AssetId, kind: ResourceKind) -> Result<bool, GatewayError> {
        self.record(GatewayCall::Exists {
            kind,
            id: id.clone(),
        });
        Ok(self.contains(kind, id))
    }
}
