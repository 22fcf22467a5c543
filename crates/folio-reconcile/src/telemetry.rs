//! Metric names and orphan reporting
//!
//! Orphan candidates are blobs that exist remotely but that no persisted
//! document references. They are logged on the `folio::orphan` target so an
//! out-of-band sweeper can collect them.

use crate::remote::RemoteAsset;
use folio_asset::ResourceKind;

pub const UPLOADS_TOTAL: &str = "folio_uploads_total";
pub const UPLOAD_FAILURES_TOTAL: &str = "folio_upload_failures_total";
pub const DELETIONS_TOTAL: &str = "folio_deletions_total";
pub const DELETION_FAILURES_TOTAL: &str = "folio_deletion_failures_total";
pub const ROLLBACKS_TOTAL: &str = "folio_rollbacks_total";
pub const ORPHAN_CANDIDATES_TOTAL: &str = "folio_orphan_candidates_total";
pub const RECONCILIATIONS_TOTAL: &str = "folio_reconciliations_total";

/// Why a blob became an orphan candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanReason {
    /// Deleting a discarded blob failed
    DeleteFailed,
    /// Compensating delete after a failed upload batch failed
    RollbackFailed,
    /// Uploaded, then the document commit failed
    PersistFailed,
    /// Uploaded, then the caller went away before commit
    Abandoned,
}

impl OrphanReason {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrphanReason::DeleteFailed => "delete_failed",
            OrphanReason::RollbackFailed => "rollback_failed",
            OrphanReason::PersistFailed => "persist_failed",
            OrphanReason::Abandoned => "abandoned",
        }
    }
}

pub(crate) fn record_upload(kind: ResourceKind, ok: bool) {
    metrics::counter!(UPLOADS_TOTAL, "kind" => kind.as_str()).increment(1);
    if !ok {
        metrics::counter!(UPLOAD_FAILURES_TOTAL, "kind" => kind.as_str()).increment(1);
    }
}

pub(crate) fn record_deletion(kind: ResourceKind, ok: bool) {
    metrics::counter!(DELETIONS_TOTAL, "kind" => kind.as_str()).increment(1);
    if !ok {
        metrics::counter!(DELETION_FAILURES_TOTAL, "kind" => kind.as_str()).increment(1);
    }
}

pub(crate) fn record_rollback() {
    metrics::counter!(ROLLBACKS_TOTAL).increment(1);
}

pub(crate) fn record_outcome(operation: &'static str, outcome: &'static str) {
    metrics::counter!(RECONCILIATIONS_TOTAL, "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub(crate) fn orphan_candidate(asset: &RemoteAsset, reason: OrphanReason) {
    tracing::error!(
        target: "folio::orphan",
        asset_id = %asset.reference.id,
        kind = %asset.kind,
        url = %asset.reference.url,
        reason = reason.as_str(),
        "orphan candidate"
    );
    metrics::counter!(ORPHAN_CANDIDATES_TOTAL, "reason" => reason.as_str()).increment(1);
}
