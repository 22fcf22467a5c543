//! Upload payloads

use std::fmt;

/// Raw file bytes waiting to be uploaded
#[derive(Clone, PartialEq, Eq, Default)]
pub struct MediaPayload {
    /// File contents
    pub bytes: Vec<u8>,
    /// Client-supplied file name
    pub filename: Option<String>,
    /// Declared MIME type
    pub content_type: Option<String>,
}

impl MediaPayload {
    /// Create payload from bytes
    #[inline]
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: None,
            content_type: None,
        }
    }

    /// With file name
    #[inline]
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// With content type
    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Byte length
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Zero-length payloads mean "no file provided"
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bytes are elided; payloads can be large.
impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("len", &self.bytes.len())
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// A payload paired with the caption it will carry once uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub payload: MediaPayload,
    pub caption: String,
}

impl NewAsset {
    /// Create new asset
    #[inline]
    #[must_use]
    pub fn new(payload: MediaPayload, caption: impl Into<String>) -> Self {
        Self {
            payload,
            caption: caption.into(),
        }
    }
}
