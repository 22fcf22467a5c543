//! Testing utilities for the Folio workspace
//!
//! Shared test helpers, fixtures, and a fault-injecting gateway.

#![allow(missing_docs)]

mod faulty;

pub use faulty::{FaultyGateway, INJECTED_FAILURE};

use folio_asset::{AssetReference, Document, MediaPayload, ResourceKind};
use folio_gateway::MemoryGateway;

/// PNG payload whose bytes and filename are both `name`
pub fn png(name: &str) -> MediaPayload {
    MediaPayload::new(name.as_bytes().to_vec())
        .with_filename(name)
        .with_content_type("image/png")
}

/// MP4 payload whose bytes and filename are both `name`
pub fn mp4(name: &str) -> MediaPayload {
    MediaPayload::new(name.as_bytes().to_vec())
        .with_filename(name)
        .with_content_type("video/mp4")
}

/// References with empty captions and gateway-style urls
pub fn image_refs(gateway: &MemoryGateway, ids: &[&str]) -> Vec<AssetReference> {
    ids.iter()
        .map(|id| AssetReference::new(*id, gateway.url_for(&(*id).into())))
        .collect()
}

/// A document whose blobs are already present in `gateway`
pub fn seeded_document(
    gateway: &MemoryGateway,
    id: &str,
    images: &[&str],
    video: Option<&str>,
) -> Document {
    for image in images {
        gateway.insert(ResourceKind::Image, *image);
    }
    let mut document = Document::new("Seeded", "Body")
        .with_id(id)
        .with_images(image_refs(gateway, images));
    if let Some(video) = video {
        gateway.insert(ResourceKind::Video, video);
        document = document.with_video(AssetReference::new(
            video,
            gateway.url_for(&video.into()),
        ));
    }
    document
}

/// `existingImages` JSON keeping `ids`
pub fn kept_images_json(ids: &[&str]) -> String {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "public_id": id }))
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Image ids of a document, in order
pub fn image_ids(document: &Document) -> Vec<String> {
    document.image_ids().map(|id| id.as_str().to_string()).collect()
}

/// Image captions of a document, in order
pub fn image_captions(document: &Document) -> Vec<String> {
    document.images.iter().map(|r| r.caption.clone()).collect()
}
