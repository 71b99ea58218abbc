//! The canonical note record shared by both stages.
//!
//! The fetch stage writes a [`NoteCollection`] to `notes.json`; the render
//! stage reads it back. Keys are camelCase on disk:
//!
//! ```json
//! {
//!   "count": 1,
//!   "items": [{
//!     "id": "c-42",
//!     "slug": "hello-world-c-42",
//!     "title": "Hello world",
//!     "publishedAt": "2024-03-01T09:30:00.000Z",
//!     "excerpt": "Hello world",
//!     "body": "<p>Hello world</p>",
//!     "url": null,
//!     "rawType": "note"
//!   }]
//! }
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One normalized entry from the feed, rendered as one detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    /// URL-safe page name; the page lives at `/notes/<slug>.html`.
    pub slug: String,
    /// Plain text, never markup.
    #[serde(default)]
    pub title: String,
    /// Timestamp string as the feed gave it. `None` sorts last.
    #[serde(default)]
    pub published_at: Option<String>,
    /// Plain text, never markup.
    #[serde(default)]
    pub excerpt: String,
    /// Trusted HTML from the feed, embedded into the page as-is.
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub raw_type: String,
}

impl Note {
    /// Parsed publication time, `None` when absent or unparsable.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at.as_deref().and_then(parse_timestamp)
    }
}

/// The persisted `{count, items}` document.
///
/// Missing keys deserialize as an empty collection; a missing or null
/// `items` list is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteCollection {
    pub count: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<Note>,
}

/// Deserialize `null` the same way as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl NoteCollection {
    /// Wrap notes, keeping `count` in step with `items`.
    pub fn new(items: Vec<Note>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Sort newest first. Notes without a usable date go last; ties keep their
/// relative order.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by_cached_key(|n| std::cmp::Reverse(n.published()));
}

/// Parse the timestamp shapes seen in the feed.
///
/// Accepts RFC 3339 (`2024-03-01T09:30:00Z`, `2024-03-01T10:30:00+01:00`),
/// naive date-times taken as UTC (`2024-03-01T09:30:00`, with optional
/// fractional seconds) and bare dates (`2024-03-01`, midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Display form of a stored timestamp: `"Jan 5, 2024"`, or `""` when the
/// value is absent or unparsable.
pub fn format_date(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}
