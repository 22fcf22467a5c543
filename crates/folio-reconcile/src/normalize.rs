//! Form normalization
//!
//! Turns a raw [`FormFields`] into an [`UpdateIntent`] or [`CreateIntent`].
//! All parsing and validation happens here, before any remote call, so a
//! rejected form never mutates anything.
//!
//! # Field rules
//!
//! - `existingImages`: JSON array of `{public_id|id, caption?}`; absent keeps
//!   every current image, `[]` discards them all, anything else that is not
//!   a JSON array (blank text, a file part) is rejected
//! - `existingVideo` / `newVideo` / `removeVideo`: the current video stays
//!   unless a new one is uploaded or `removeVideo` is truthy
//! - `newImages[i]` pairs with `newImageCaptions[i]`; zero-length files are
//!   dropped together with their caption
//! - `tags`: JSON array, or a comma-separated list
//! - `affiliateLinks`: JSON array of objects or url strings, or a
//!   newline/comma-separated url list
//! - `headings`: JSON array of `{text, slug?, level?}`, or one heading per
//!   line (`## Text` sets the level, bare lines are level 2)

use crate::config::ReconcileConfig;
use crate::error::ValidationError;
use crate::form::{fields, FormFields, FormValue};
use crate::intent::{
    CreateIntent, ImageSelection, KeptAsset, ScalarUpdates, UpdateIntent, VideoAction,
};
use folio_asset::{AffiliateLink, DocumentStatus, Heading, MediaPayload, NewAsset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(\S.*)$").expect("heading pattern is valid"));

static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

const DEFAULT_HEADING_LEVEL: u8 = 2;

/// Form-to-intent translator
#[derive(Debug, Clone)]
pub struct Normalizer {
    allowed_image_types: Vec<String>,
    allowed_video_types: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&ReconcileConfig::default())
    }
}

impl Normalizer {
    /// Create normalizer using the content-type allow-lists of `config`
    #[must_use]
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            allowed_image_types: config.allowed_image_types.clone(),
            allowed_video_types: config.allowed_video_types.clone(),
        }
    }

    /// Normalize an update form
    ///
    /// # Errors
    /// - `ValidationError::InvalidField` naming the first offending field
    pub fn normalize_update(&self, form: &FormFields) -> Result<UpdateIntent, ValidationError> {
        // A present field must parse; only an explicit `[]` discards everything.
        let kept_images = if form.has(fields::EXISTING_IMAGES) {
            let raw = form.get_text(fields::EXISTING_IMAGES).unwrap_or_default();
            ImageSelection::Keep(parse_kept_images(raw)?)
        } else {
            ImageSelection::KeepAll
        };

        let new_images = self.new_images(form)?;
        let video = self.video_action(form)?;
        let scalars = self.scalars(form)?;

        Ok(UpdateIntent {
            kept_images,
            new_images,
            video,
            scalars,
        })
    }

    /// Normalize a create form
    ///
    /// # Errors
    /// - `ValidationError::MissingField` if `title` or `content` is absent or blank
    /// - `ValidationError::InvalidField` naming the first offending field
    pub fn normalize_create(&self, form: &FormFields) -> Result<CreateIntent, ValidationError> {
        let title = non_blank_text(form, fields::TITLE)
            .ok_or(ValidationError::MissingField(fields::TITLE))?
            .trim()
            .to_string();
        let content = non_blank_text(form, fields::CONTENT)
            .ok_or(ValidationError::MissingField(fields::CONTENT))?
            .to_string();

        let new_images = self.new_images(form)?;
        let video = self.new_video(form)?;

        let mut scalars = self.scalars(form)?;
        scalars.title = None;
        scalars.content = None;

        Ok(CreateIntent {
            title,
            content,
            new_images,
            video,
            scalars,
        })
    }

    fn new_images(&self, form: &FormFields) -> Result<Vec<NewAsset>, ValidationError> {
        let captions = form.get_all(fields::NEW_IMAGE_CAPTIONS);

        let mut assets = Vec::new();
        for (index, part) in form.get_all(fields::NEW_IMAGES).iter().enumerate() {
            let Some(payload) = part.as_file() else {
                continue;
            };
            check_content_type(payload, &self.allowed_image_types, fields::NEW_IMAGES)?;
            let caption = captions
                .get(index)
                .and_then(FormValue::as_text)
                .unwrap_or_default();
            assets.push(NewAsset::new(payload.clone(), caption));
        }
        Ok(assets)
    }

    fn new_video(&self, form: &FormFields) -> Result<Option<NewAsset>, ValidationError> {
        let Some(payload) = form.get_all(fields::NEW_VIDEO).iter().find_map(FormValue::as_file)
        else {
            return Ok(None);
        };
        check_content_type(payload, &self.allowed_video_types, fields::NEW_VIDEO)?;
        let caption = form.get_text(fields::NEW_VIDEO_CAPTION).unwrap_or_default();
        Ok(Some(NewAsset::new(payload.clone(), caption)))
    }

    fn video_action(&self, form: &FormFields) -> Result<VideoAction, ValidationError> {
        let replacement = self.new_video(form)?;
        let remove = form.get_text(fields::REMOVE_VIDEO).is_some_and(is_truthy);

        match (replacement, remove) {
            (Some(_), true) => Err(ValidationError::invalid(
                fields::REMOVE_VIDEO,
                "cannot remove and replace the video in one request",
            )),
            (Some(asset), false) => Ok(VideoAction::ReplaceWith(asset)),
            (None, true) => Ok(VideoAction::Remove),
            (None, false) => {
                let kept = match non_blank_text(form, fields::EXISTING_VIDEO) {
                    Some(raw) => parse_kept_video(raw)?,
                    None => None,
                };
                Ok(VideoAction::Keep(kept))
            }
        }
    }

    fn scalars(&self, form: &FormFields) -> Result<ScalarUpdates, ValidationError> {
        let mut scalars = ScalarUpdates::default();

        if let Some(title) = form.get_text(fields::TITLE) {
            let title = title.trim();
            if title.is_empty() {
                return Err(ValidationError::invalid(fields::TITLE, "must not be blank"));
            }
            scalars.title = Some(title.to_string());
        }
        scalars.content = form.get_text(fields::CONTENT).map(str::to_string);
        scalars.summary = form.get_text(fields::SUMMARY).map(str::to_string);

        if let Some(raw) = form.get_text(fields::STATUS) {
            let status = DocumentStatus::parse(raw).ok_or_else(|| {
                ValidationError::invalid(
                    fields::STATUS,
                    format!("expected 'active' or 'inactive', got '{}'", raw.trim()),
                )
            })?;
            scalars.status = Some(status);
        }

        if let Some(raw) = form.get_text(fields::TAGS) {
            scalars.tags = Some(parse_tags(raw)?);
        }
        if let Some(raw) = form.get_text(fields::HEADINGS) {
            scalars.headings = Some(parse_headings(raw)?);
        }
        if let Some(raw) = form.get_text(fields::AFFILIATE_LINKS) {
            scalars.affiliate_links = Some(parse_affiliate_links(raw)?);
        }

        Ok(scalars)
    }
}

fn non_blank_text<'a>(form: &'a FormFields, name: &str) -> Option<&'a str> {
    form.get_text(name).filter(|raw| !raw.trim().is_empty())
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn check_content_type(
    payload: &MediaPayload,
    allowed: &[String],
    field: &'static str,
) -> Result<(), ValidationError> {
    let Some(declared) = payload.content_type.as_deref() else {
        return Ok(());
    };
    let essence = declared.split(';').next().unwrap_or_default().trim();
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(essence)) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("unsupported content type '{essence}'"),
        ))
    }
}

fn parse_json(raw: &str, field: &'static str) -> Result<Value, ValidationError> {
    serde_json::from_str(raw).map_err(|e| ValidationError::invalid(field, e.to_string()))
}

fn json_array(raw: &str, field: &'static str) -> Result<Vec<Value>, ValidationError> {
    match parse_json(raw, field)? {
        Value::Array(items) => Ok(items),
        _ => Err(ValidationError::invalid(field, "expected a JSON array")),
    }
}

/// Parse the `existingImages` list
///
/// # Errors
/// - `InvalidField("existingImages")` if not a JSON array of id-bearing objects
pub fn parse_kept_images(raw: &str) -> Result<Vec<KeptAsset>, ValidationError> {
    json_array(raw, fields::EXISTING_IMAGES)?
        .into_iter()
        .map(|item| {
            KeptAsset::deserialize(item)
                .map_err(|e| ValidationError::invalid(fields::EXISTING_IMAGES, e.to_string()))
        })
        .collect()
}

/// Parse the `existingVideo` object (`null` means no video mentioned)
///
/// # Errors
/// - `InvalidField("existingVideo")` if not an id-bearing object or null
pub fn parse_kept_video(raw: &str) -> Result<Option<KeptAsset>, ValidationError> {
    match parse_json(raw, fields::EXISTING_VIDEO)? {
        Value::Null => Ok(None),
        value @ Value::Object(_) => KeptAsset::deserialize(value)
            .map(Some)
            .map_err(|e| ValidationError::invalid(fields::EXISTING_VIDEO, e.to_string())),
        _ => Err(ValidationError::invalid(
            fields::EXISTING_VIDEO,
            "expected a JSON object",
        )),
    }
}

/// Parse tags from a JSON array or a comma-separated list
///
/// Blank entries are dropped and surrounding whitespace trimmed.
///
/// # Errors
/// - `InvalidField("tags")` on malformed JSON or non-scalar entries
pub fn parse_tags(raw: &str) -> Result<Vec<String>, ValidationError> {
    let raw = raw.trim();
    let tags: Vec<String> = if raw.starts_with('[') {
        json_array(raw, fields::TAGS)?
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(ValidationError::invalid(
                    fields::TAGS,
                    "tag entries must be strings",
                )),
            })
            .collect::<Result<_, _>>()?
    } else {
        raw.split(',').map(str::to_string).collect()
    };

    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

/// Parse affiliate links
///
/// # Errors
/// - `InvalidField("affiliateLinks")` on malformed JSON or unsupported entries
pub fn parse_affiliate_links(raw: &str) -> Result<Vec<AffiliateLink>, ValidationError> {
    let raw = raw.trim();
    if raw.starts_with('[') || raw.starts_with('{') {
        return json_array(raw, fields::AFFILIATE_LINKS)?
            .into_iter()
            .map(|item| match item {
                Value::String(url) => Ok(link_from_url(&url)),
                value @ Value::Object(_) => AffiliateLink::deserialize(value)
                    .map_err(|e| ValidationError::invalid(fields::AFFILIATE_LINKS, e.to_string())),
                _ => Err(ValidationError::invalid(
                    fields::AFFILIATE_LINKS,
                    "entries must be objects or url strings",
                )),
            })
            .filter(|link| link.as_ref().map_or(true, |l| !l.url.trim().is_empty()))
            .collect();
    }

    Ok(raw
        .split(['\n', ','])
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(link_from_url)
        .collect())
}

fn link_from_url(url: &str) -> AffiliateLink {
    AffiliateLink {
        url: url.trim().to_string(),
        ..AffiliateLink::default()
    }
}

#[derive(Deserialize)]
struct HeadingInput {
    text: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    level: Option<u8>,
}

/// Parse headings from JSON or line-oriented text
///
/// # Errors
/// - `InvalidField("headings")` on malformed JSON, empty text or a level outside 1..=6
pub fn parse_headings(raw: &str) -> Result<Vec<Heading>, ValidationError> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return json_array(raw, fields::HEADINGS)?
            .into_iter()
            .map(|item| {
                let input = HeadingInput::deserialize(item)
                    .map_err(|e| ValidationError::invalid(fields::HEADINGS, e.to_string()))?;
                heading(
                    &input.text,
                    input.slug,
                    input.level.unwrap_or(DEFAULT_HEADING_LEVEL),
                )
            })
            .collect();
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if !line.starts_with('#') {
                return heading(line, None, DEFAULT_HEADING_LEVEL);
            }
            let caps = MARKDOWN_HEADING.captures(line).ok_or_else(|| {
                ValidationError::invalid(fields::HEADINGS, format!("malformed heading '{line}'"))
            })?;
            let level = u8::try_from(caps[1].len()).unwrap_or(DEFAULT_HEADING_LEVEL);
            heading(&caps[2], None, level)
        })
        .collect()
}

fn heading(text: &str, slug: Option<String>, level: u8) -> Result<Heading, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::invalid(
            fields::HEADINGS,
            "heading text must not be blank",
        ));
    }
    if !(1..=6).contains(&level) {
        return Err(ValidationError::invalid(
            fields::HEADINGS,
            format!("heading level {level} outside 1..=6"),
        ));
    }
    let slug = slug
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(text));
    Ok(Heading {
        text: text.to_string(),
        slug,
        level,
    })
}

/// Lowercase, collapse non-alphanumeric runs into `-`, trim dashes
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_SLUG
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
