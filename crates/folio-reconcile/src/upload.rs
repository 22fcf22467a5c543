//! Upload orchestrator
//!
//! Uploads a batch of new assets with bounded concurrency and all-or-nothing
//! semantics: if any upload fails, every sibling that succeeded is deleted
//! again before the error is returned.
//!
//! The batch runs on its own task. A caller that stops waiting does not leak
//! blobs: the task finishes, notices nobody is listening, and rolls back.
//! Once handed over, uploads are held in a [`PendingUploads`] guard that rolls
//! them back on drop unless released for commit.

use crate::deletion::DeletionOrchestrator;
use crate::error::{ReconcileError, UploadSlot};
use crate::fanout::join_indexed;
use crate::remote::RemoteAsset;
use crate::telemetry::{self, OrphanReason};
use folio_asset::{AssetReference, NewAsset, ResourceKind};
use folio_gateway::{AssetGateway, GatewayError, SharedGateway};
use tokio::sync::oneshot;

/// Upload tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Maximum uploads in flight
    pub max_concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

/// Assets to upload for one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
    /// New images in display order
    pub images: Vec<NewAsset>,
    /// Replacement video
    pub video: Option<NewAsset>,
}

impl UploadBatch {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.video.is_none()
    }
}

/// Successfully uploaded references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedAssets {
    /// Image references, same order as [`UploadBatch::images`]
    pub images: Vec<AssetReference>,
    pub video: Option<AssetReference>,
}

impl UploadedAssets {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.video.is_none()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len() + usize::from(self.video.is_some())
    }

    /// Every uploaded blob, images first
    #[must_use]
    pub fn remote_assets(&self) -> Vec<RemoteAsset> {
        self.images
            .iter()
            .cloned()
            .map(RemoteAsset::image)
            .chain(self.video.iter().cloned().map(RemoteAsset::video))
            .collect()
    }
}

/// Bounded, all-or-nothing uploader
#[derive(Clone)]
pub struct UploadOrchestrator {
    gateway: SharedGateway,
    options: UploadOptions,
}

impl UploadOrchestrator {
    /// Create orchestrator
    #[must_use]
    pub fn new(gateway: SharedGateway, options: UploadOptions) -> Self {
        Self { gateway, options }
    }

    /// Upload every asset of `batch`
    ///
    /// # Errors
    /// - `ReconcileError::AssetUploadFailed` for the lowest failing slot
    ///   (images before video); successful siblings are already rolled back
    /// - `ReconcileError::Cancelled` if the upload task died without reporting
    pub async fn upload(&self, batch: UploadBatch) -> Result<PendingUploads, ReconcileError> {
        if batch.is_empty() {
            return Ok(self.pending(UploadedAssets::default()));
        }

        let gateway = self.gateway.clone();
        let options = self.options;
        let (tx, rx) = oneshot::channel();

        // The result travels inside the guard, so uploads left unread in a
        // dropped channel are still rolled back.
        tokio::spawn(async move {
            let result = run_batch(&gateway, batch, options)
                .await
                .map(|assets| PendingUploads::guard(gateway.clone(), options, assets));
            if let Err(Ok(pending)) = tx.send(result) {
                tracing::warn!(
                    count = pending.assets().len(),
                    "caller dropped during upload, rolling back"
                );
                pending.discard(OrphanReason::Abandoned).await;
            }
        });

        rx.await.map_err(|_| ReconcileError::Cancelled)?
    }

    fn pending(&self, assets: UploadedAssets) -> PendingUploads {
        PendingUploads::guard(self.gateway.clone(), self.options, assets)
    }
}

async fn run_batch(
    gateway: &SharedGateway,
    batch: UploadBatch,
    options: UploadOptions,
) -> Result<UploadedAssets, ReconcileError> {
    let UploadBatch { images, video } = batch;
    let image_count = images.len();

    let items = images
        .into_iter()
        .map(|asset| (ResourceKind::Image, asset))
        .chain(video.map(|asset| (ResourceKind::Video, asset)));

    let results = join_indexed(items, options.max_concurrency, |index, (kind, asset)| {
        let gateway = gateway.clone();
        async move {
            let result = gateway.upload(&asset.payload, kind).await;
            telemetry::record_upload(kind, result.is_ok());
            tracing::debug!(index, %kind, ok = result.is_ok(), "upload finished");
            result.map(|blob| AssetReference::from_blob(blob, asset.caption))
        }
    })
    .await;

    let mut uploaded = UploadedAssets::default();
    let mut failure: Option<(UploadSlot, GatewayError)> = None;

    for (index, result) in results.into_iter().enumerate() {
        let is_image = index < image_count;
        match result {
            Ok(reference) if is_image => uploaded.images.push(reference),
            Ok(reference) => uploaded.video = Some(reference),
            Err(cause) => {
                if failure.is_none() {
                    let slot = if is_image {
                        UploadSlot::Image(index)
                    } else {
                        UploadSlot::Video
                    };
                    failure = Some((slot, cause));
                }
            }
        }
    }

    match failure {
        None => {
            tracing::debug!(images = image_count, video = uploaded.video.is_some(), "batch uploaded");
            Ok(uploaded)
        }
        Some((slot, cause)) => {
            tracing::warn!(%slot, error = %cause, rolled_back = uploaded.len(), "upload failed");
            rollback(gateway, &uploaded, options, OrphanReason::RollbackFailed).await;
            Err(ReconcileError::AssetUploadFailed { slot, cause })
        }
    }
}

async fn rollback(
    gateway: &SharedGateway,
    uploaded: &UploadedAssets,
    options: UploadOptions,
    reason: OrphanReason,
) {
    if uploaded.is_empty() {
        return;
    }
    telemetry::record_rollback();
    let report = DeletionOrchestrator::new(gateway.clone(), options.max_concurrency)
        .delete_with_reason(uploaded.remote_assets(), reason)
        .await;
    if !report.is_clean() {
        tracing::error!(failed = report.warnings.len(), "rollback incomplete");
    }
}

/// Uploaded blobs awaiting commit
///
/// Dropping the guard without calling [`PendingUploads::release`] deletes
/// the blobs on a background task.
pub struct PendingUploads {
    gateway: SharedGateway,
    options: UploadOptions,
    assets: UploadedAssets,
    armed: bool,
}

impl PendingUploads {
    fn guard(gateway: SharedGateway, options: UploadOptions, assets: UploadedAssets) -> Self {
        Self {
            gateway,
            options,
            assets,
            armed: true,
        }
    }

    /// Uploaded references
    #[inline]
    #[must_use]
    pub fn assets(&self) -> &UploadedAssets {
        &self.assets
    }

    /// Hand the references over for commit; the guard no longer rolls back
    #[must_use]
    pub fn release(mut self) -> UploadedAssets {
        self.armed = false;
        std::mem::take(&mut self.assets)
    }

    /// Delete the uploads now instead of on drop
    pub async fn discard(mut self, reason: OrphanReason) {
        self.armed = false;
        let assets = std::mem::take(&mut self.assets);
        rollback(&self.gateway, &assets, self.options, reason).await;
    }
}

impl std::fmt::Debug for PendingUploads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingUploads")
            .field("assets", &self.assets)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

impl Drop for PendingUploads {
    fn drop(&mut self) {
        if !self.armed || self.assets.is_empty() {
            return;
        }
        let assets = std::mem::take(&mut self.assets);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(count = assets.len(), "uncommitted uploads dropped, rolling back");
                let gateway = self.gateway.clone();
                let options = self.options;
                handle.spawn(async move {
                    rollback(&gateway, &assets, options, OrphanReason::Abandoned).await;
                });
            }
            Err(_) => {
                for asset in assets.remote_assets() {
                    telemetry::orphan_candidate(&asset, OrphanReason::Abandoned);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_asset::MediaPayload;
    use folio_gateway::{GatewayCall, MemoryGateway};
    use std::sync::Arc;

    fn asset(caption: &str) -> NewAsset {
        NewAsset::new(MediaPayload::new(vec![1, 2, 3]), caption)
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let gateway = Arc::new(MemoryGateway::new());
        let orchestrator = UploadOrchestrator::new(gateway.clone(), UploadOptions::default());
        let pending = orchestrator.upload(UploadBatch::default()).await.unwrap();
        assert!(pending.release().is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn uploads_images_and_video_with_captions() {
        let gateway = Arc::new(MemoryGateway::new());
        let orchestrator = UploadOrchestrator::new(gateway.clone(), UploadOptions::default());

        let batch = UploadBatch {
            images: vec![asset("a"), asset("b")],
            video: Some(asset("v")),
        };
        let uploaded = orchestrator.upload(batch).await.unwrap().release();

        let captions: Vec<_> = uploaded.images.iter().map(|r| r.caption.as_str()).collect();
        assert_eq!(captions, vec!["a", "b"]);
        assert_eq!(uploaded.video.as_ref().map(|v| v.caption.as_str()), Some("v"));
        assert_eq!(gateway.blob_count(ResourceKind::Image), 2);
        assert_eq!(gateway.blob_count(ResourceKind::Video), 1);
    }

    #[tokio::test]
    async fn dropped_guard_rolls_back() {
        let gateway = Arc::new(MemoryGateway::new());
        let orchestrator = UploadOrchestrator::new(gateway.clone(), UploadOptions::default());

        let pending = orchestrator
            .upload(UploadBatch {
                images: vec![asset("a")],
                video: None,
            })
            .await
            .unwrap();
        assert_eq!(gateway.blob_count(ResourceKind::Image), 1);
        drop(pending);

        for _ in 0..100 {
            if gateway.blob_count(ResourceKind::Image) == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(gateway.blob_count(ResourceKind::Image), 0);
        assert!(gateway
            .calls()
            .iter()
            .any(|c| matches!(c, GatewayCall::Delete { .. })));
    }
}
