//! JSON description of a multipart form
//!
//! ```json
//! {"fields": [
//!   {"name": "title", "value": "Hello"},
//!   {"name": "newImages", "file": "cover.png", "content_type": "image/png"}
//! ]}
//! ```
//!
//! File paths are resolved against the directory of the form file.
//!
//! # Update forms
//!
//! Media is only removed when the form says so:
//!
//! - leaving out `existingImages` keeps every current image; send
//!   `{"name": "existingImages", "value": "[]"}` to drop them all. A blank
//!   value is rejected rather than read as "none".
//! - leaving out `newVideo` and `existingVideo` keeps the current video; send
//!   `{"name": "removeVideo", "value": "true"}` to drop it.

use anyhow::{Context, Result};
use folio_asset::MediaPayload;
use folio_reconcile::{FormFields, FormValue};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One form part
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    File {
        name: String,
        file: PathBuf,
        #[serde(default)]
        content_type: Option<String>,
    },
    Text {
        name: String,
        value: String,
    },
}

/// Parsed form file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormFile {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl FormFile {
    /// Parse a form description
    ///
    /// # Errors
    /// Fails on malformed JSON or a part with neither `value` nor `file`.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid form description")
    }

    /// Read every referenced file and build the form, keeping part order
    ///
    /// # Errors
    /// Fails when a referenced file cannot be read.
    pub async fn into_fields(self, base: &Path) -> Result<FormFields> {
        let mut form = FormFields::new();
        for spec in self.fields {
            match spec {
                FieldSpec::Text { name, value } => form.push(name, FormValue::Text(value)),
                FieldSpec::File {
                    name,
                    file,
                    content_type,
                } => {
                    let path = base.join(&file);
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("reading {} for {name}", path.display()))?;
                    let content_type =
                        content_type.unwrap_or_else(|| guess_content_type(&path).to_string());
                    let mut payload = MediaPayload::new(bytes).with_content_type(content_type);
                    if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
                        payload = payload.with_filename(filename);
                    }
                    form.push(name, FormValue::File(payload));
                }
            }
        }
        Ok(form)
    }
}

/// Load a form file and its attachments
///
/// # Errors
/// Fails when the form or an attachment cannot be read or parsed.
pub async fn load_form(path: &Path) -> Result<FormFields> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading form {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    FormFile::parse(&raw)?.into_fields(base).await
}

/// Content type from the file extension
#[must_use]
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}
