//! Normalized reconciliation intents
//!
//! Intents are the typed output of the normalizer: every textual field has
//! been parsed, every file has been paired with its caption, and nothing
//! touches the network yet.

use folio_asset::{AffiliateLink, AssetId, DocumentStatus, Heading, NewAsset};
use serde::Deserialize;

/// An existing reference the caller wants to keep
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeptAsset {
    #[serde(rename = "public_id", alias = "id")]
    pub id: AssetId,
    /// Replacement caption, when supplied
    #[serde(default)]
    pub caption: Option<String>,
}

impl KeptAsset {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<AssetId>) -> Self {
        Self {
            id: id.into(),
            caption: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Which current images survive
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSelection {
    /// The caller did not mention existing images
    #[default]
    KeepAll,
    /// Keep exactly these ids (an empty list discards every image)
    Keep(Vec<KeptAsset>),
}

/// What happens to the single video slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoAction {
    /// Leave the slot alone, optionally re-captioning the current video
    Keep(Option<KeptAsset>),
    /// Upload this payload and discard the current video
    ReplaceWith(NewAsset),
    /// Empty the slot and discard the current video
    Remove,
}

impl Default for VideoAction {
    fn default() -> Self {
        VideoAction::Keep(None)
    }
}

impl VideoAction {
    /// Whether the current video (if any) must be deleted
    #[inline]
    #[must_use]
    pub fn discards_current(&self) -> bool {
        !matches!(self, VideoAction::Keep(_))
    }
}

/// Scalar field updates; `None` leaves the field unchanged
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScalarUpdates {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub status: Option<DocumentStatus>,
    pub tags: Option<Vec<String>>,
    pub headings: Option<Vec<Heading>>,
    pub affiliate_links: Option<Vec<AffiliateLink>>,
}

/// Typed update request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateIntent {
    pub kept_images: ImageSelection,
    /// New images in form order, captions already paired
    pub new_images: Vec<NewAsset>,
    pub video: VideoAction,
    pub scalars: ScalarUpdates,
}

/// Typed create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    pub title: String,
    pub content: String,
    pub new_images: Vec<NewAsset>,
    pub video: Option<NewAsset>,
    /// Remaining optional fields (title and content are already set)
    pub scalars: ScalarUpdates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kept_asset_accepts_either_key() {
        let a: KeptAsset = serde_json::from_str(r#"{"public_id":"i1","caption":"x"}"#).unwrap();
        let b: KeptAsset = serde_json::from_str(r#"{"id":"i1","url":"ignored"}"#).unwrap();
        assert_eq!(a, KeptAsset::new("i1").with_caption("x"));
        assert_eq!(b, KeptAsset::new("i1"));
    }

    #[test]
    fn default_intent_keeps_everything() {
        let intent = UpdateIntent::default();
        assert_eq!(intent.kept_images, ImageSelection::KeepAll);
        assert_eq!(intent.scalars, ScalarUpdates::default());
        assert!(!intent.video.discards_current());
        assert!(VideoAction::Remove.discards_current());
    }
}
