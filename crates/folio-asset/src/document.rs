//! Media-backed documents
//!
//! A [`Document`] owns its scalar fields plus the asset lists that point at
//! remote blobs. Asset lists are mutated only by the reconciliation engine.

use crate::asset::{AssetId, AssetReference, ImageAssetList, ResourceKind, VideoSlot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Document identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wrap an existing identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate new identifier (ULID for sortability)
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Identifier as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Visible
    Active,
    /// Hidden (default for new documents)
    #[default]
    Inactive,
}

impl DocumentStatus {
    /// Parse `active` / `inactive`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Table-of-contents entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub slug: String,
    pub level: u8,
}

/// Outbound affiliate link
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateLink {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub click_count: u64,
}

/// Content record with media references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// URL-safe form of `title`, kept in step with it on every title change
    #[serde(default)]
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub affiliate_links: Vec<AffiliateLink>,
    /// Display-ordered images
    #[serde(default)]
    pub images: ImageAssetList,
    /// Single video slot
    #[serde(default)]
    pub video: VideoSlot,
    /// Incremented on every committed merge
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create new document with a generated id and no assets
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::generate(),
            title: title.into(),
            slug: String::new(),
            content: content.into(),
            summary: String::new(),
            status: DocumentStatus::default(),
            tags: Vec::new(),
            headings: Vec::new(),
            affiliate_links: Vec::new(),
            images: Vec::new(),
            video: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// With explicit id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = id.into();
        self
    }

    /// With images
    #[inline]
    #[must_use]
    pub fn with_images(mut self, images: ImageAssetList) -> Self {
        self.images = images;
        self
    }

    /// With video
    #[inline]
    #[must_use]
    pub fn with_video(mut self, video: AssetReference) -> Self {
        self.video = Some(video);
        self
    }

    /// Image ids in display order
    pub fn image_ids(&self) -> impl Iterator<Item = &AssetId> {
        self.images.iter().map(|r| &r.id)
    }

    /// Every remote blob the document references, images first
    #[must_use]
    pub fn stored_assets(&self) -> Vec<(ResourceKind, &AssetReference)> {
        self.images
            .iter()
            .map(|r| (ResourceKind::Image, r))
            .chain(self.video.iter().map(|r| (ResourceKind::Video, r)))
            .collect()
    }

    /// Bump version and modification time
    #[inline]
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_generation() {
        let id1 = DocumentId::generate();
        let id2 = DocumentId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn new_document_is_inactive_and_empty() {
        let doc = Document::new("t", "c");
        assert_eq!(doc.status, DocumentStatus::Inactive);
        assert!(doc.images.is_empty());
        assert!(doc.video.is_none());
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn stored_assets_lists_images_then_video() {
        let doc = Document::new("t", "c")
            .with_images(vec![AssetReference::new("i1", ""), AssetReference::new("i2", "")])
            .with_video(AssetReference::new("v1", ""));

        let kinds: Vec<(ResourceKind, &str)> = doc
            .stored_assets()
            .into_iter()
            .map(|(k, r)| (k, r.id.as_str()))
            .collect();

        assert_eq!(
            kinds,
            vec![
                (ResourceKind::Image, "i1"),
                (ResourceKind::Image, "i2"),
                (ResourceKind::Video, "v1"),
            ]
        );
    }

    #[test]
    fn touch_increments_version() {
        let mut doc = Document::new("t", "c");
        let before = doc.updated_at;
        doc.touch();
        assert_eq!(doc.version, 1);
        assert!(doc.updated_at >= before);
    }

    #[test]
    fn status_parse() {
        assert_eq!(DocumentStatus::parse("active"), Some(DocumentStatus::Active));
        assert_eq!(DocumentStatus::parse(" inactive "), Some(DocumentStatus::Inactive));
        assert_eq!(DocumentStatus::parse("draft"), None);
    }

    #[test]
    fn document_json_shape() {
        let doc = Document::new("t", "c").with_id("d1");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], "d1");
        assert!(json.get("affiliateLinks").is_some());
        assert!(json["video"].is_null());
        assert_eq!(json["slug"], "");
    }

    #[test]
    fn documents_without_slug_still_load() {
        let json = serde_json::json!({
            "id": "d1",
            "title": "t",
            "content": "c",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
        });
        let doc: Document = serde_json::from_value(json).unwrap();
        assert!(doc.slug.is_empty());
        assert_eq!(doc.version, 0);
    }
}
