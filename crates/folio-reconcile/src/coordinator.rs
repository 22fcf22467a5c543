//! Reconciliation coordinator
//!
//! Drives one request through the phase machine:
//!
//! 1. **Validating**: normalize the form, load the document, diff images,
//!    optionally probe kept references
//! 2. **Uploading**: all-or-nothing upload of new assets
//! 3. **Deleting**: re-read the stored version, then best-effort deletion of
//!    discarded blobs. A version that moved since loading rolls the uploads
//!    back and fails with a conflict before anything is deleted.
//! 4. **Merging**: in-memory merge, version bump
//! 5. **Persisting**: single store write guarded by the loaded version
//!
//! Validation and upload failures leave the store untouched. A persist
//! failure reports every blob uploaded for the request as an orphan
//! candidate; it is not rolled back.

use crate::config::ReconcileConfig;
use crate::deletion::DeletionOrchestrator;
use crate::diff::diff_images;
use crate::error::{ReconcileError, ReconcileWarning};
use crate::fanout::join_indexed;
use crate::form::FormFields;
use crate::intent::{CreateIntent, UpdateIntent, VideoAction};
use crate::mutator::{DocumentMutator, MergePlan, VideoOutcome};
use crate::normalize::{slugify, Normalizer};
use crate::phase::{FailureStage, PhaseTracker, ReconcilePhase};
use crate::remote::RemoteAsset;
use crate::telemetry::{self, OrphanReason};
use crate::upload::{UploadBatch, UploadOptions, UploadOrchestrator, UploadedAssets};
use folio_asset::{AssetReference, Document, DocumentId};
use folio_gateway::{AssetGateway, SharedGateway};
use folio_store::{check_version, DocumentStore, SharedStore, StoreError};

/// Result of a successful reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// The persisted document (for delete: the document as it was removed)
    pub document: Document,
    /// Non-fatal problems encountered along the way
    pub warnings: Vec<ReconcileWarning>,
    /// Phases visited, in order
    pub phases: Vec<ReconcilePhase>,
}

/// Reconciliation coordinator
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct Coordinator {
    gateway: SharedGateway,
    store: SharedStore,
    config: ReconcileConfig,
    normalizer: Normalizer,
    uploads: UploadOrchestrator,
    deletions: DeletionOrchestrator,
}

impl Coordinator {
    /// Create coordinator over a gateway and a store
    #[must_use]
    pub fn new(gateway: SharedGateway, store: SharedStore, config: ReconcileConfig) -> Self {
        let uploads = UploadOrchestrator::new(
            gateway.clone(),
            UploadOptions {
                max_concurrency: config.upload_concurrency(),
            },
        );
        let deletions = DeletionOrchestrator::new(gateway.clone(), config.delete_concurrency());
        Self {
            normalizer: Normalizer::new(&config),
            gateway,
            store,
            config,
            uploads,
            deletions,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &SharedGateway {
        &self.gateway
    }

    /// Reconcile an existing document with an update form
    ///
    /// # Errors
    /// - `Validation` / `NotFound` / `LoadFailed` before any remote call
    /// - `AssetUploadFailed` after rolling back sibling uploads
    /// - `PersistFailed` when the store rejects the commit, or with
    ///   `VersionConflict` when the document changed before blobs were deleted
    #[tracing::instrument(name = "update", skip_all, fields(document_id = %id))]
    pub async fn update(
        &self,
        id: &DocumentId,
        form: &FormFields,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let mut phases = PhaseTracker::new("update");
        let result = self.run_update(&mut phases, id, form).await;
        finish("update", &phases, result)
    }

    /// Create a new document from a form
    ///
    /// # Errors
    /// - `Validation` if `title` or `content` is missing or a field is malformed
    /// - `AssetUploadFailed` after rolling back sibling uploads
    /// - `PersistFailed` when the store rejects the insert
    #[tracing::instrument(name = "create", skip_all)]
    pub async fn create(&self, form: &FormFields) -> Result<ReconcileOutcome, ReconcileError> {
        let mut phases = PhaseTracker::new("create");
        let result = self.run_create(&mut phases, form).await;
        finish("create", &phases, result)
    }

    /// Remove a document and every blob it references
    ///
    /// # Errors
    /// - `NotFound` / `LoadFailed` if the document cannot be loaded
    /// - `PersistFailed` if the store refuses the removal (no blob is touched)
    #[tracing::instrument(name = "delete", skip_all, fields(document_id = %id))]
    pub async fn delete(&self, id: &DocumentId) -> Result<ReconcileOutcome, ReconcileError> {
        let mut phases = PhaseTracker::new("delete");
        let result = self.run_delete(&mut phases, id).await;
        finish("delete", &phases, result)
    }

    async fn run_update(
        &self,
        phases: &mut PhaseTracker,
        id: &DocumentId,
        form: &FormFields,
    ) -> Result<(Document, Vec<ReconcileWarning>), ReconcileError> {
        let intent = self
            .normalizer
            .normalize_update(form)
            .map_err(|e| phases.fail(FailureStage::Validation, ReconcileError::from(e)))?;
        let mut document = self.load(phases, id).await?;
        let loaded_version = document.version;

        let UpdateIntent {
            kept_images,
            new_images,
            video,
            scalars,
        } = intent;

        let diff = diff_images(&document.images, &kept_images);
        if !diff.unknown.is_empty() {
            tracing::debug!(unknown = ?diff.unknown, "ignoring kept ids the document does not hold");
        }

        let discard_video = video.discards_current();
        let mut warnings = if self.config.verify_kept_assets {
            let kept_video = if discard_video { None } else { document.video.as_ref() };
            self.verify_kept(&diff.to_keep, kept_video).await
        } else {
            Vec::new()
        };

        let (replacement, kept_video) = match video {
            VideoAction::ReplaceWith(asset) => (Some(asset), None),
            VideoAction::Keep(kept) => (None, kept),
            VideoAction::Remove => (None, None),
        };

        phases.advance(ReconcilePhase::Uploading)?;
        let pending = self
            .uploads
            .upload(UploadBatch {
                images: new_images,
                video: replacement,
            })
            .await
            .map_err(|e| phases.fail(FailureStage::Upload, e))?;

        let mut discarded: Vec<RemoteAsset> =
            diff.to_delete.iter().cloned().map(RemoteAsset::image).collect();
        if discard_video {
            discarded.extend(document.video.clone().map(RemoteAsset::video));
        }

        // Blobs are only deleted while the stored version is still the loaded one.
        if !discarded.is_empty() {
            if let Err(cause) = self.check_unchanged(id, loaded_version).await {
                tracing::warn!(error = %cause, "document changed during upload, rolling back");
                pending.discard(OrphanReason::RollbackFailed).await;
                return Err(phases.fail(
                    FailureStage::Persist,
                    ReconcileError::PersistFailed {
                        cause,
                        orphaned: Vec::new(),
                    },
                ));
            }
        }

        phases.advance(ReconcilePhase::Deleting)?;
        let report = self.deletions.delete_all(discarded).await;
        warnings.extend(report.warnings);

        phases.advance(ReconcilePhase::Merging)?;
        let uploaded = pending.assets().clone();
        let video = match (discard_video, uploaded.video) {
            (false, _) => VideoOutcome::Keep(kept_video),
            (true, Some(reference)) => VideoOutcome::Replaced(reference),
            (true, None) => VideoOutcome::Removed,
        };
        DocumentMutator::apply(
            &mut document,
            MergePlan {
                kept_images: diff.to_keep,
                new_images: uploaded.images,
                video,
                scalars,
            },
        );

        phases.advance(ReconcilePhase::Persisting)?;
        let uploaded = pending.release();
        self.persist(phases, &document, Some(loaded_version), &uploaded)
            .await?;

        phases.advance(ReconcilePhase::Done)?;
        Ok((document, warnings))
    }

    async fn run_create(
        &self,
        phases: &mut PhaseTracker,
        form: &FormFields,
    ) -> Result<(Document, Vec<ReconcileWarning>), ReconcileError> {
        let CreateIntent {
            title,
            content,
            new_images,
            video,
            scalars,
        } = self
            .normalizer
            .normalize_create(form)
            .map_err(|e| phases.fail(FailureStage::Validation, ReconcileError::from(e)))?;

        phases.advance(ReconcilePhase::Uploading)?;
        let pending = self
            .uploads
            .upload(UploadBatch {
                images: new_images,
                video,
            })
            .await
            .map_err(|e| phases.fail(FailureStage::Upload, e))?;

        phases.advance(ReconcilePhase::Merging)?;
        let mut document = Document::new(title, content);
        document.slug = slugify(&document.title);
        let uploaded = pending.assets().clone();
        DocumentMutator::apply(
            &mut document,
            MergePlan {
                kept_images: Vec::new(),
                new_images: uploaded.images,
                video: uploaded
                    .video
                    .map_or(VideoOutcome::Keep(None), VideoOutcome::Replaced),
                scalars,
            },
        );

        phases.advance(ReconcilePhase::Persisting)?;
        let uploaded = pending.release();
        self.persist(phases, &document, None, &uploaded).await?;

        phases.advance(ReconcilePhase::Done)?;
        Ok((document, Vec::new()))
    }

    async fn run_delete(
        &self,
        phases: &mut PhaseTracker,
        id: &DocumentId,
    ) -> Result<(Document, Vec<ReconcileWarning>), ReconcileError> {
        let document = self.load(phases, id).await?;

        phases.advance(ReconcilePhase::Persisting)?;
        if let Err(cause) = self.store.delete(id).await {
            return Err(phases.fail(
                FailureStage::Persist,
                ReconcileError::PersistFailed {
                    cause,
                    orphaned: Vec::new(),
                },
            ));
        }

        phases.advance(ReconcilePhase::Deleting)?;
        let targets = document
            .stored_assets()
            .into_iter()
            .map(|(kind, reference)| RemoteAsset::new(kind, reference.clone()))
            .collect();
        let report = self.deletions.delete_all(targets).await;

        phases.advance(ReconcilePhase::Done)?;
        Ok((document, report.warnings))
    }

    async fn load(
        &self,
        phases: &mut PhaseTracker,
        id: &DocumentId,
    ) -> Result<Document, ReconcileError> {
        match self.store.find_by_id(id).await {
            Ok(Some(document)) => Ok(document),
            Ok(None) => Err(phases.fail(
                FailureStage::Validation,
                ReconcileError::NotFound(id.clone()),
            )),
            Err(cause) => Err(phases.fail(
                FailureStage::Validation,
                ReconcileError::LoadFailed(cause),
            )),
        }
    }

    /// Compare the stored version with the one this request loaded
    async fn check_unchanged(&self, id: &DocumentId, loaded_version: u64) -> Result<(), StoreError> {
        let current = self.store.find_by_id(id).await?.map(|d| d.version);
        check_version(id, Some(loaded_version), current)
    }

    async fn persist(
        &self,
        phases: &mut PhaseTracker,
        document: &Document,
        expected_version: Option<u64>,
        uploaded: &UploadedAssets,
    ) -> Result<(), ReconcileError> {
        let Err(cause) = self.store.save(document, expected_version).await else {
            return Ok(());
        };

        let orphaned = uploaded.remote_assets();
        tracing::error!(
            document_id = %document.id,
            error = %cause,
            orphaned = orphaned.len(),
            "persist failed"
        );
        for asset in &orphaned {
            telemetry::orphan_candidate(asset, OrphanReason::PersistFailed);
        }
        Err(phases.fail(
            FailureStage::Persist,
            ReconcileError::PersistFailed { cause, orphaned },
        ))
    }

    /// Probe kept references; missing blobs become warnings
    async fn verify_kept(
        &self,
        images: &[AssetReference],
        video: Option<&AssetReference>,
    ) -> Vec<ReconcileWarning> {
        let targets: Vec<RemoteAsset> = images
            .iter()
            .cloned()
            .map(RemoteAsset::image)
            .chain(video.cloned().map(RemoteAsset::video))
            .collect();

        let probes = join_indexed(targets, self.config.upload_concurrency(), |_, target| {
            let gateway = self.gateway.clone();
            async move {
                let result = gateway.exists(&target.reference.id, target.kind).await;
                (target, result)
            }
        })
        .await;

        probes
            .into_iter()
            .filter_map(|(target, result)| match result {
                Ok(true) => None,
                Ok(false) => {
                    tracing::warn!(asset = %target, "kept reference is dangling");
                    Some(ReconcileWarning::DanglingReference {
                        kind: target.kind,
                        reference: target.reference,
                    })
                }
                Err(e) => {
                    tracing::warn!(asset = %target, error = %e, "existence probe failed");
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn finish(
    operation: &'static str,
    phases: &PhaseTracker,
    result: Result<(Document, Vec<ReconcileWarning>), ReconcileError>,
) -> Result<ReconcileOutcome, ReconcileError> {
    match result {
        Ok((document, warnings)) => {
            telemetry::record_outcome(operation, "success");
            tracing::info!(
                document_id = %document.id,
                version = document.version,
                images = document.images.len(),
                video = document.video.is_some(),
                warnings = warnings.len(),
                "{operation} complete"
            );
            Ok(ReconcileOutcome {
                document,
                warnings,
                phases: phases.history().to_vec(),
            })
        }
        Err(e) => {
            telemetry::record_outcome(operation, e.label());
            tracing::warn!(phase = %phases.current(), error = %e, "{operation} failed");
            Err(e)
        }
    }
}
