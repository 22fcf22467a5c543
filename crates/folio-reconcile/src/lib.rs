//! Folio Reconciliation Engine
//!
//! Reconciles a document's media references with a remote asset store. Given
//! a document and a form describing the desired end state, the engine
//! computes which blobs to keep, upload and delete, performs those remote
//! mutations, and persists the merged document.
//!
//! # Core Concepts
//!
//! - [`Normalizer`]: parses raw form fields into a typed [`UpdateIntent`]
//! - [`diff_images`]: partitions current images into keep/delete sets
//! - [`UploadOrchestrator`]: bounded, index-preserving, all-or-nothing uploads
//! - [`DeletionOrchestrator`]: bounded, best-effort deletions
//! - [`DocumentMutator`]: pure in-memory merge
//! - [`Coordinator`]: the phase machine tying it together
//!
//! # Guarantees
//!
//! - Validation and upload failures leave the document store untouched
//! - Uploaded image order always matches form order, whatever the
//!   completion order
//! - Deletion failures never fail the request; they come back as warnings
//! - Every blob that may have leaked is logged on the `folio::orphan` target
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_reconcile::{Coordinator, FormFields, ReconcileConfig};
//! use folio_gateway::MemoryGateway;
//! use folio_store::MemoryDocumentStore;
//! use std::sync::Arc;
//!
//! let coordinator = Coordinator::new(
//!     Arc::new(MemoryGateway::new()),
//!     Arc::new(MemoryDocumentStore::new()),
//!     ReconcileConfig::default(),
//! );
//!
//! let form = FormFields::new()
//!     .text("existingImages", r#"[{"public_id":"blogs/images/keep"}]"#)
//!     .text("removeVideo", "true");
//! let outcome = coordinator.update(&document_id, &form).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod deletion;
pub mod diff;
pub mod error;
pub mod fanout;
pub mod form;
pub mod intent;
pub mod mutator;
pub mod normalize;
pub mod phase;
pub mod remote;
pub mod telemetry;
pub mod upload;

pub use config::ReconcileConfig;
pub use coordinator::{Coordinator, ReconcileOutcome};
pub use deletion::{DeletionOrchestrator, DeletionReport};
pub use diff::{diff_images, AssetDiff};
pub use error::{ConfigError, ReconcileError, ReconcileWarning, UploadSlot, ValidationError};
pub use fanout::join_indexed;
pub use form::{fields, FormFields, FormValue};
pub use intent::{
    CreateIntent, ImageSelection, KeptAsset, ScalarUpdates, UpdateIntent, VideoAction,
};
pub use mutator::{DocumentMutator, MergePlan, VideoOutcome};
pub use normalize::{slugify, Normalizer};
pub use phase::{FailureStage, PhaseError, PhaseTracker, ReconcilePhase};
pub use remote::RemoteAsset;
pub use telemetry::OrphanReason;
pub use upload::{PendingUploads, UploadBatch, UploadOptions, UploadOrchestrator, UploadedAssets};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
