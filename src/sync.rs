//! Copies extractor metadata onto an embed record.
//!
//! The synchronizer never touches the record directly: it reads a
//! [`SyncInput`] and hands back an [`EmbedPatch`] plus, when a new thumbnail
//! should be stored locally, a [`MirrorRequest`].

use tracing::debug;

use crate::types::{EmbedRecord, EmbedType, SourceMetadata};

/// Fields of the record the synchronizer looks at.
#[derive(Debug, Clone, Copy)]
pub struct SyncInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub source_url: &'a str,
    pub source_image_url: &'a str,
    pub has_image: bool,
    /// Whether `source_url` differs from the value last persisted.
    pub source_url_changed: bool,
}

impl<'a> SyncInput<'a> {
    pub fn from_record(record: &'a EmbedRecord, source_url_changed: bool) -> Self {
        Self {
            title: &record.title,
            description: &record.description,
            source_url: &record.source_url,
            source_image_url: &record.source_image_url,
            has_image: record.has_image(),
            source_url_changed,
        }
    }
}

/// Embed markup and geometry, copied only when the source URL changes.
#[derive(Debug, Clone, PartialEq)]
pub struct RichFields {
    pub html: String,
    pub embed_type: EmbedType,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rich: Option<RichFields>,
    pub source_image_url: Option<String>,
}

impl EmbedPatch {
    pub fn is_empty(&self) -> bool { *self == EmbedPatch::default() }

    pub fn apply(self, record: &mut EmbedRecord) {
        if let Some(t) = self.title { record.title = t; }
        if let Some(d) = self.description { record.description = d; }
        if let Some(r) = self.rich {
            record.html = r.html;
            record.embed_type = Some(r.embed_type);
            record.width = r.width;
            record.height = r.height;
            record.aspect_ratio = r.aspect_ratio;
        }
        if let Some(u) = self.source_image_url { record.source_image_url = u; }
    }
}

/// A remote thumbnail that should be copied into local storage.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRequest {
    pub image_url: String,
    /// Record title after backfill; drives the local file name.
    pub record_title: String,
    /// Title stamped onto the stored asset.
    pub asset_title: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    pub patch: EmbedPatch,
    pub mirror: Option<MirrorRequest>,
}

pub fn synchronize(input: SyncInput<'_>, meta: &SourceMetadata) -> SyncOutcome {
    let mut out = SyncOutcome::default();
    if input.source_url.is_empty() {
        return out;
    }

    // Blank fields are healed on every save.
    if input.title.is_empty() {
        out.patch.title = Some(meta.title.clone());
    }
    if input.description.is_empty() {
        out.patch.description = Some(meta.description.clone());
    }

    if !input.source_url_changed || input.has_image {
        debug!(url = input.source_url, changed = input.source_url_changed, has_image = input.has_image, "keeping embed fields");
        return out;
    }

    out.patch.rich = Some(RichFields {
        html: meta.code.clone(),
        embed_type: meta.embed_type.clone(),
        width: meta.width,
        height: meta.height,
        aspect_ratio: meta.aspect_ratio,
    });

    match meta.image.as_deref().filter(|u| !u.is_empty()) {
        Some(image) if image != input.source_image_url => {
            out.patch.source_image_url = Some(image.to_string());
            let record_title = out.patch.title.clone().unwrap_or_else(|| input.title.to_string());
            out.mirror = Some(MirrorRequest {
                image_url: image.to_string(),
                record_title,
                asset_title: meta.title.clone(),
            });
        }
        _ => debug!(url = input.source_url, "thumbnail unchanged"),
    }
    out
}
