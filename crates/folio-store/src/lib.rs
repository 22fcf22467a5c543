//! Folio Document Store
//!
//! Persistence boundary for media-backed documents:
//! - [`DocumentStore`]: `find_by_id`, whole-document `save`, `delete`
//! - [`MemoryDocumentStore`]: concurrent in-process map
//! - [`JsonDirDocumentStore`]: one JSON file per document
//!
//! Saves carry the version the caller loaded; both backends reject a save
//! whose expected version no longer matches (optimistic concurrency).

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod json_dir;
mod memory;
mod store;

pub use error::StoreError;
pub use json_dir::JsonDirDocumentStore;
pub use memory::MemoryDocumentStore;
pub use store::{check_version, DocumentStore, SharedStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
