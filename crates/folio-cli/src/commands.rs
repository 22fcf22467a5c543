//! Subcommand handlers
//!
//! Each handler returns the JSON value printed on stdout.

use crate::settings::Settings;
use anyhow::Result;
use folio_asset::DocumentId;
use folio_gateway::{FsGateway, SharedGateway, TimedGateway};
use folio_reconcile::{Coordinator, FormFields, ReconcileError, ReconcileOutcome, ReconcileWarning};
use folio_store::{DocumentStore, JsonDirDocumentStore, SharedStore};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// Coordinator wired to the filesystem backends under a data directory
pub struct App {
    coordinator: Coordinator,
}

impl App {
    /// Open (creating if needed) the stores under `data_dir`
    ///
    /// # Errors
    /// Fails when the document directory cannot be created.
    pub async fn open(data_dir: &Path, settings: &Settings) -> Result<Self> {
        let gateway: SharedGateway = Arc::new(TimedGateway::new(
            FsGateway::new(settings.gateway_config(data_dir)),
            settings.reconcile.gateway_timeout(),
        ));
        let store: SharedStore =
            Arc::new(JsonDirDocumentStore::open(Settings::documents_dir(data_dir)).await?);
        tracing::debug!(data_dir = %data_dir.display(), "stores opened");

        Ok(Self {
            coordinator: Coordinator::new(gateway, store, settings.reconcile.clone()),
        })
    }

    pub async fn create(&self, form: &FormFields) -> Result<Value> {
        let outcome = self.coordinator.create(form).await?;
        Ok(render_outcome(&outcome))
    }

    pub async fn update(&self, id: &DocumentId, form: &FormFields) -> Result<Value> {
        let outcome = self.coordinator.update(id, form).await?;
        Ok(render_outcome(&outcome))
    }

    pub async fn delete(&self, id: &DocumentId) -> Result<Value> {
        let outcome = self.coordinator.delete(id).await?;
        Ok(render_outcome(&outcome))
    }

    /// Print a stored document
    ///
    /// # Errors
    /// `ReconcileError::NotFound` for an unknown id, `LoadFailed` on store errors.
    pub async fn show(&self, id: &DocumentId) -> Result<Value> {
        let document = self
            .coordinator
            .store()
            .find_by_id(id)
            .await
            .map_err(ReconcileError::LoadFailed)?
            .ok_or_else(|| ReconcileError::NotFound(id.clone()))?;
        Ok(json!({ "document": document }))
    }

    /// Print every stored document, newest first
    ///
    /// # Errors
    /// `LoadFailed` when the document directory cannot be read.
    pub async fn list(&self) -> Result<Value> {
        let documents = self
            .coordinator
            .store()
            .list()
            .await
            .map_err(ReconcileError::LoadFailed)?;
        Ok(json!({ "documents": documents }))
    }
}

/// JSON form of a finished reconciliation
#[must_use]
pub fn render_outcome(outcome: &ReconcileOutcome) -> Value {
    json!({
        "document": outcome.document,
        "warnings": outcome.warnings.iter().map(render_warning).collect::<Vec<_>>(),
        "phases": outcome.phases.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn render_warning(warning: &ReconcileWarning) -> Value {
    let (code, kind) = match warning {
        ReconcileWarning::AssetDeletionFailed { kind, .. } => ("asset_deletion_failed", kind),
        ReconcileWarning::DanglingReference { kind, .. } => ("dangling_reference", kind),
    };
    json!({
        "code": code,
        "kind": kind,
        "id": warning.reference().id,
        "message": warning.to_string(),
    })
}

/// One-line error report with the HTTP status a web front end would use
#[must_use]
pub fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ReconcileError>() {
        Some(reconcile) => format!(
            "error [{} {}]: {err:#}",
            reconcile.http_status_hint(),
            reconcile.label()
        ),
        None => format!("error: {err:#}"),
    }
}
