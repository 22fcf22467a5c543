//! Document mutator
//!
//! Pure, in-memory merge of a reconciliation's results into a document. No
//! I/O happens here, so the window between merge and persist stays as short
//! as the store call itself.

use crate::intent::{KeptAsset, ScalarUpdates};
use crate::normalize::slugify;
use folio_asset::{AssetReference, Document};

/// Resolved state of the video slot after uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Slot unchanged, optionally re-captioned
    Keep(Option<KeptAsset>),
    /// Slot now holds a freshly uploaded video
    Replaced(AssetReference),
    /// Slot emptied
    Removed,
}

/// Everything a merge writes into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// Surviving images in current order
    pub kept_images: Vec<AssetReference>,
    /// Newly uploaded images in form order
    pub new_images: Vec<AssetReference>,
    pub video: VideoOutcome,
    pub scalars: ScalarUpdates,
}

/// Applies a [`MergePlan`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMutator;

impl DocumentMutator {
    /// Merge `plan` into `document` and bump its version
    ///
    /// Images become `kept ++ new`. A re-caption for a video id the document
    /// does not hold is ignored.
    pub fn apply(document: &mut Document, plan: MergePlan) {
        let MergePlan {
            mut kept_images,
            new_images,
            video,
            scalars,
        } = plan;

        kept_images.extend(new_images);
        document.images = kept_images;

        match video {
            VideoOutcome::Keep(Some(kept)) => {
                if let (Some(current), Some(caption)) = (document.video.as_mut(), kept.caption) {
                    if current.id == kept.id {
                        current.caption = caption;
                    } else {
                        tracing::debug!(requested = %kept.id, current = %current.id, "ignoring caption for unknown video");
                    }
                }
            }
            VideoOutcome::Keep(None) => {}
            VideoOutcome::Replaced(reference) => document.video = Some(reference),
            VideoOutcome::Removed => document.video = None,
        }

        apply_scalars(document, scalars);
        document.touch();
    }
}

fn apply_scalars(document: &mut Document, scalars: ScalarUpdates) {
    let ScalarUpdates {
        title,
        content,
        summary,
        status,
        tags,
        headings,
        affiliate_links,
    } = scalars;

    if let Some(title) = title {
        document.slug = slugify(&title);
        document.title = title;
    }
    if let Some(content) = content {
        document.content = content;
    }
    if let Some(summary) = summary {
        document.summary = summary;
    }
    if let Some(status) = status {
        document.status = status;
    }
    if let Some(tags) = tags {
        document.tags = tags;
    }
    if let Some(headings) = headings {
        document.headings = headings;
    }
    if let Some(links) = affiliate_links {
        document.affiliate_links = links;
    }
}
