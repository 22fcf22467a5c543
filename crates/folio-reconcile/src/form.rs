//! Multipart form input
//!
//! A form is an ordered multi-map: the same name may carry several parts,
//! and position within a name is meaningful (`newImages[i]` pairs with
//! `newImageCaptions[i]`).

use folio_asset::MediaPayload;
use indexmap::IndexMap;

/// Recognized form field names
pub mod fields {
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const SUMMARY: &str = "summary";
    pub const STATUS: &str = "status";
    pub const TAGS: &str = "tags";
    pub const HEADINGS: &str = "headings";
    pub const AFFILIATE_LINKS: &str = "affiliateLinks";
    pub const EXISTING_IMAGES: &str = "existingImages";
    pub const NEW_IMAGES: &str = "newImages";
    pub const NEW_IMAGE_CAPTIONS: &str = "newImageCaptions";
    pub const EXISTING_VIDEO: &str = "existingVideo";
    pub const NEW_VIDEO: &str = "newVideo";
    pub const NEW_VIDEO_CAPTION: &str = "newVideoCaption";
    pub const REMOVE_VIDEO: &str = "removeVideo";
}

/// One form part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(MediaPayload),
}

impl FormValue {
    /// Text content, if this is a text part
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text),
            FormValue::File(_) => None,
        }
    }

    /// Payload, if this is a non-empty file part
    #[inline]
    #[must_use]
    pub fn as_file(&self) -> Option<&MediaPayload> {
        match self {
            FormValue::File(payload) if !payload.is_empty() => Some(payload),
            _ => None,
        }
    }
}

/// Ordered multipart form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    parts: IndexMap<String, Vec<FormValue>>,
}

impl FormFields {
    /// Create empty form
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a text part appended under `name`
    #[inline]
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, FormValue::Text(value.into()));
        self
    }

    /// With a file part appended under `name`
    #[inline]
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, payload: MediaPayload) -> Self {
        self.push(name, FormValue::File(payload));
        self
    }

    /// Append a part
    pub fn push(&mut self, name: impl Into<String>, value: FormValue) {
        self.parts.entry(name.into()).or_default().push(value);
    }

    /// Whether any part was sent under `name`
    #[inline]
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.parts.get(name).is_some_and(|v| !v.is_empty())
    }

    /// First part under `name`
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.parts.get(name).and_then(|v| v.first())
    }

    /// First text part under `name`
    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get_all(name).iter().find_map(FormValue::as_text)
    }

    /// Every part under `name`, in arrival order
    #[inline]
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[FormValue] {
        self.parts.get(name).map_or(&[], Vec::as_slice)
    }

    /// Field names in first-arrival order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Number of distinct field names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no parts were sent
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
