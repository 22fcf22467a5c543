//! Folio command-line front end
//!
//! Drives the reconciliation engine against filesystem backends: documents
//! are JSON files under `<data-dir>/documents`, blobs are files under
//! `<data-dir>/blobs`. Forms are described as JSON (see [`form_file`]).
//!
//! An update never drops media implicitly: omitted `existingImages` keeps
//! every image and an omitted video field keeps the video. Removal takes
//! `existingImages=[]` or `removeVideo=true`.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod form_file;
pub mod logging;
pub mod settings;

pub use commands::{render_error, render_outcome, App};
pub use form_file::{load_form, FieldSpec, FormFile};
pub use settings::{GatewaySettings, Settings};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
