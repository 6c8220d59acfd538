use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of embedded content as reported by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmbedType {
    Video,
    Rich,
    Link,
    Photo,
    Other(String),
}

impl EmbedType {
    pub fn as_str(&self) -> &str {
        match self { EmbedType::Video => "video", EmbedType::Rich => "rich", EmbedType::Link => "link", EmbedType::Photo => "photo", EmbedType::Other(s) => s.as_str() }
    }
}

impl From<&str> for EmbedType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => EmbedType::Video,
            "rich" => EmbedType::Rich,
            "link" => EmbedType::Link,
            "photo" => EmbedType::Photo,
            other => EmbedType::Other(other.to_string()),
        }
    }
}

impl From<String> for EmbedType {
    fn from(s: String) -> Self { EmbedType::from(s.as_str()) }
}

impl From<EmbedType> for String {
    fn from(t: EmbedType) -> Self { t.as_str().to_string() }
}

impl fmt::Display for EmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// One embeddable item attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedRecord {
    pub id: Option<i64>,
    /// Profile the record belongs to ("Embed", "Video", ...).
    pub record_type: String,
    pub title: String,
    /// Only ever set from extractor output.
    pub embed_type: Option<EmbedType>,
    pub source_url: String,
    /// Last remote thumbnail URL that was mirrored.
    pub source_image_url: String,
    pub html: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub aspect_ratio: Option<f64>,
    pub description: String,
    /// Locally stored image asset; a manual upload disables mirroring.
    pub image_id: Option<i64>,
}

impl EmbedRecord {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self { record_type: record_type.into(), ..Default::default() }
    }

    pub fn has_image(&self) -> bool { self.image_id.is_some() }
}

/// What the metadata extractor knows about a URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub title: String,
    pub description: String,
    /// Embed markup (oEmbed `html`).
    pub code: String,
    pub embed_type: EmbedType,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub aspect_ratio: Option<f64>,
    /// Thumbnail / preview image URL.
    pub image: Option<String>,
}

impl Default for EmbedType {
    fn default() -> Self { EmbedType::Link }
}

/// Percentage of height relative to width, rounded to three decimals.
pub fn aspect_ratio(width: Option<i64>, height: Option<i64>) -> Option<f64> {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 => Some(((h as f64 / w as f64) * 100.0 * 1000.0).round() / 1000.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_type_parses_known_and_other() {
        assert_eq!(EmbedType::from("Video"), EmbedType::Video);
        assert_eq!(EmbedType::from(" photo "), EmbedType::Photo);
        assert_eq!(EmbedType::from("audio"), EmbedType::Other("audio".into()));
        assert_eq!(EmbedType::Other("audio".into()).to_string(), "audio");
    }

    #[test]
    fn embed_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&EmbedType::Rich).unwrap();
        assert_eq!(json, "\"rich\"");
        let back: EmbedType = serde_json::from_str("\"link\"").unwrap();
        assert_eq!(back, EmbedType::Link);
    }

    #[test]
    fn aspect_ratio_rounds_to_three_places() {
        assert_eq!(aspect_ratio(Some(640), Some(360)), Some(56.25));
        assert_eq!(aspect_ratio(Some(3), Some(1)), Some(33.333));
        assert_eq!(aspect_ratio(Some(0), Some(1)), None);
        assert_eq!(aspect_ratio(None, Some(1)), None);
    }
}
