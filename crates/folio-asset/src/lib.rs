//! Folio Asset Model
//!
//! Data model for documents whose body references externally stored media.
//!
//! # Core Concepts
//!
//! - [`AssetReference`]: one stored blob (store-assigned id + url) plus a
//!   document-owned caption
//! - [`ResourceKind`]: image or video, selects the remote folder and delete API
//! - [`Document`]: the content record with its ordered image list and single
//!   video slot
//! - [`MediaPayload`]: raw bytes of a file waiting to be uploaded
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_asset::{AssetReference, Document, StoredBlob};
//!
//! let mut doc = Document::new("Title", "Body");
//! let blob = StoredBlob::new("blogs/images/abc", "https://cdn/blogs/images/abc");
//! doc.images.push(AssetReference::from_blob(blob, "cover"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod asset;
mod document;
mod payload;

pub use asset::{AssetId, AssetReference, ImageAssetList, ResourceKind, StoredBlob, VideoSlot};
pub use document::{AffiliateLink, Document, DocumentId, DocumentStatus, Heading};
pub use payload::{MediaPayload, NewAsset};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
