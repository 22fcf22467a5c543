//! Reconciliation phases
//!
//! Update: `Validating -> Uploading -> Deleting -> Merging -> Persisting -> Done`.
//! Create skips `Deleting`. Delete runs `Validating -> Persisting -> Deleting
//! -> Done` so the document disappears before its blobs do.
//!
//! `Failed` is reachable from `Validating`, `Uploading` and `Persisting`
//! only; deletion failures are never fatal. An update whose document changed
//! while its uploads ran fails as `Failed(Persist)` straight from `Uploading`,
//! before any blob is deleted.

use serde::Serialize;
use std::fmt;

/// Stage at which a reconciliation aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Validation,
    Upload,
    Persist,
}

/// Reconciliation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePhase {
    Validating,
    Uploading,
    Deleting,
    Merging,
    Persisting,
    Done,
    Failed(FailureStage),
}

impl ReconcilePhase {
    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcilePhase::Done | ReconcilePhase::Failed(_))
    }
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcilePhase::Validating => f.write_str("validating"),
            ReconcilePhase::Uploading => f.write_str("uploading"),
            ReconcilePhase::Deleting => f.write_str("deleting"),
            ReconcilePhase::Merging => f.write_str("merging"),
            ReconcilePhase::Persisting => f.write_str("persisting"),
            ReconcilePhase::Done => f.write_str("done"),
            ReconcilePhase::Failed(stage) => write!(f, "failed({stage:?})"),
        }
    }
}

/// Illegal phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal phase transition: {from} -> {to}")]
pub struct PhaseError {
    pub from: ReconcilePhase,
    pub to: ReconcilePhase,
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: ReconcilePhase) -> Vec<ReconcilePhase> {
    use FailureStage as S;
    use ReconcilePhase::*;
    match from {
        Validating => vec![Uploading, Persisting, Failed(S::Validation)],
        Uploading => vec![Deleting, Merging, Failed(S::Upload), Failed(S::Persist)],
        Deleting => vec![Merging, Done],
        Merging => vec![Persisting],
        Persisting => vec![Deleting, Done, Failed(S::Persist)],
        Done | Failed(_) => vec![],
    }
}

/// Validate a phase transition
///
/// # Errors
/// - `PhaseError` if `to` is not reachable from `from`
pub fn validate_transition(from: ReconcilePhase, to: ReconcilePhase) -> Result<(), PhaseError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PhaseError { from, to })
    }
}

/// Tracks one reconciliation's path through the phases
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    operation: &'static str,
    current: ReconcilePhase,
    history: Vec<ReconcilePhase>,
}

impl PhaseTracker {
    /// Start in `Validating`
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            current: ReconcilePhase::Validating,
            history: vec![ReconcilePhase::Validating],
        }
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> ReconcilePhase {
        self.current
    }

    /// Every phase visited, in order
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[ReconcilePhase] {
        &self.history
    }

    /// Move to `to`
    ///
    /// # Errors
    /// - `PhaseError` if the transition is illegal; the tracker is unchanged
    pub fn advance(&mut self, to: ReconcilePhase) -> Result<(), PhaseError> {
        validate_transition(self.current, to)?;
        tracing::debug!(operation = self.operation, from = %self.current, %to, "phase");
        self.current = to;
        self.history.push(to);
        Ok(())
    }

    /// Move to `Failed(stage)` and hand back `error`
    pub(crate) fn fail<E>(&mut self, stage: FailureStage, error: E) -> E {
        if let Err(e) = self.advance(ReconcilePhase::Failed(stage)) {
            tracing::error!(operation = self.operation, error = %e, "failure recorded out of sequence");
        }
        error
    }
}
