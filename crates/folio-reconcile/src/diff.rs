//! Image set difference
//!
//! Pure computation of which current images survive an update. The result
//! partitions the current list: every reference lands in exactly one of
//! `to_keep` or `to_delete`, and both preserve the current display order.

use crate::intent::{ImageSelection, KeptAsset};
use folio_asset::{AssetId, AssetReference};
use std::collections::HashMap;

/// Partition of the current image list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetDiff {
    /// Surviving references, captions updated from the selection
    pub to_keep: Vec<AssetReference>,
    /// References whose blobs must be deleted
    pub to_delete: Vec<AssetReference>,
    /// Requested ids the document does not hold (ignored)
    pub unknown: Vec<AssetId>,
}

/// Compute which current images survive `selection`
///
/// Kept ids that the document does not hold are reported in
/// [`AssetDiff::unknown`] and never introduce references.
#[must_use]
pub fn diff_images(current: &[AssetReference], selection: &ImageSelection) -> AssetDiff {
    let kept = match selection {
        ImageSelection::KeepAll => {
            return AssetDiff {
                to_keep: current.to_vec(),
                ..AssetDiff::default()
            }
        }
        ImageSelection::Keep(kept) => kept,
    };

    let requested: HashMap<&AssetId, &KeptAsset> = kept.iter().map(|k| (&k.id, k)).collect();

    let mut diff = AssetDiff::default();
    for reference in current {
        match requested.get(&reference.id) {
            Some(k) => {
                let mut reference = reference.clone();
                if let Some(caption) = &k.caption {
                    reference.caption.clone_from(caption);
                }
                diff.to_keep.push(reference);
            }
            None => diff.to_delete.push(reference.clone()),
        }
    }

    diff.unknown = kept
        .iter()
        .filter(|k| !current.iter().any(|r| r.id == k.id))
        .map(|k| k.id.clone())
        .collect();

    diff
}
