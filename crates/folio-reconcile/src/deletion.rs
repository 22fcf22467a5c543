//! Deletion orchestrator
//!
//! Deletes discarded blobs concurrently. Individual failures never abort the
//! batch; each becomes a [`ReconcileWarning::AssetDeletionFailed`] and an
//! orphan candidate.

use crate::error::ReconcileWarning;
use crate::fanout::join_indexed;
use crate::remote::RemoteAsset;
use crate::telemetry::{self, OrphanReason};
use folio_gateway::{AssetGateway, GatewayError, SharedGateway};

/// Result of a deletion batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// Blobs confirmed gone
    pub deleted: Vec<RemoteAsset>,
    /// One warning per blob that could not be deleted
    pub warnings: Vec<ReconcileWarning>,
}

impl DeletionReport {
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Concurrent best-effort blob deleter
#[derive(Clone)]
pub struct DeletionOrchestrator {
    gateway: SharedGateway,
    max_concurrency: usize,
}

impl DeletionOrchestrator {
    /// Create orchestrator
    #[must_use]
    pub fn new(gateway: SharedGateway, max_concurrency: usize) -> Self {
        Self {
            gateway,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Delete every target
    ///
    /// A blob that is already absent counts as deleted.
    pub async fn delete_all(&self, targets: Vec<RemoteAsset>) -> DeletionReport {
        self.delete_with_reason(targets, OrphanReason::DeleteFailed)
            .await
    }

    pub(crate) async fn delete_with_reason(
        &self,
        targets: Vec<RemoteAsset>,
        reason: OrphanReason,
    ) -> DeletionReport {
        if targets.is_empty() {
            return DeletionReport::default();
        }

        let results = join_indexed(targets, self.max_concurrency, |_, target| {
            let gateway = self.gateway.clone();
            async move {
                let result = gateway.delete(&target.reference.id, target.kind).await;
                (target, result)
            }
        })
        .await;

        let mut report = DeletionReport::default();
        for (target, result) in results {
            match result {
                Ok(()) => {
                    telemetry::record_deletion(target.kind, true);
                    tracing::debug!(asset = %target, "deleted");
                    report.deleted.push(target);
                }
                Err(GatewayError::NotFound { .. }) => {
                    telemetry::record_deletion(target.kind, true);
                    tracing::debug!(asset = %target, "already absent");
                    report.deleted.push(target);
                }
                Err(cause) => {
                    telemetry::record_deletion(target.kind, false);
                    tracing::warn!(asset = %target, error = %cause, "delete failed");
                    telemetry::orphan_candidate(&target, reason);
                    report.warnings.push(ReconcileWarning::AssetDeletionFailed {
                        kind: target.kind,
                        reference: target.reference,
                        cause,
                    });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_asset::{AssetReference, ResourceKind};
    use folio_gateway::MemoryGateway;
    use std::sync::Arc;

    #[tokio::test]
    async fn deletes_present_and_tolerates_absent() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.insert(ResourceKind::Image, "i1");

        let orchestrator = DeletionOrchestrator::new(gateway.clone(), 2);
        let report = orchestrator
            .delete_all(vec![
                RemoteAsset::image(AssetReference::new("i1", "")),
                RemoteAsset::image(AssetReference::new("gone", "")),
            ])
            .await;

        assert!(report.is_clean());
        assert_eq!(report.deleted.len(), 2);
        assert!(!gateway.contains(ResourceKind::Image, &"i1".into()));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let gateway = Arc::new(MemoryGateway::new());
        let report = DeletionOrchestrator::new(gateway.clone(), 2)
            .delete_all(vec![])
            .await;
        assert_eq!(report, DeletionReport::default());
        assert!(gateway.calls().is_empty());
    }
}
