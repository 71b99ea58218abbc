//! Feed fetching and normalization.
//!
//! Stage 1 of the pipeline. One HTTP GET against the configured endpoint,
//! then a pure transformation from raw feed items to canonical [`Note`]s.
//!
//! ## Expected Feed Shape
//!
//! ```text
//! { "items": [ {
//!     "type": "note",
//!     "entity_key": "c-42",            # or "id": 42
//!     "context": { "timestamp": "...", "users": [ { "handle": "..." } ] },
//!     "title", "text", "caption",      # plain or HTML text
//!     "html", "body_html",             # rich body
//!     "url", "created_at", "updated_at"
//! }, ... ] }
//! ```
//!
//! Every item field is optional. An item whose fields have unexpected types
//! is skipped with a warning; it does not fail the run.
//!
//! ## Output Files
//!
//! ```text
//! data/
//! ├── notes_raw.json    # response body, byte for byte
//! └── notes.json        # { "count": N, "items": [Note, ...] }
//! ```
//!
//! The raw file is written before parsing so a malformed response can still
//! be inspected. `notes.json` is written last and only when everything
//! before it succeeded.

use crate::config::{FeedConfig, SiteConfig};
use crate::note::{Note, NoteCollection, null_as_default, sort_notes};
use crate::text::{normalize_text, note_slug, truncate_chars};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Longest title kept, in characters.
pub const TITLE_MAX_CHARS: usize = 80;
/// Longest excerpt kept, in characters.
pub const EXCERPT_MAX_CHARS: usize = 300;
/// Title used when an item has no text at all.
pub const FALLBACK_TITLE: &str = "Note";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level feed document. Items stay untyped until [`FeedItem::from_value`]
/// so one odd item cannot sink the whole feed.
#[derive(Debug, Default, Deserialize)]
pub struct Feed {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<serde_json::Value>,
}

/// The fields of a feed item that feed into a [`Note`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeedItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub entity_key: Option<String>,
    pub id: Option<serde_json::Value>,
    pub context: Option<ItemContext>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub html: Option<String>,
    pub body_html: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemContext {
    pub timestamp: Option<String>,
    pub users: Vec<ItemUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemUser {
    pub handle: Option<String>,
}

impl FeedItem {
    /// Decode one raw item; `None` when its fields have the wrong types.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed feed item");
                None
            }
        }
    }

    /// Handle of the first user in the item context.
    pub fn author_handle(&self) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.users.first())
            .and_then(|u| u.handle.as_deref())
    }

    /// Stable id: entity key, then `i-<id>`, then a timestamp fallback made
    /// unique by the item's position in the feed.
    fn note_id(&self, fallback_millis: i64, position: usize) -> String {
        if let Some(key) = non_empty(self.entity_key.as_deref()) {
            return key.to_string();
        }
        let id = match &self.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        match id {
            Some(id) => format!("i-{id}"),
            None => format!("ts-{fallback_millis}-{position}"),
        }
    }

    fn published_at(&self) -> Option<String> {
        let timestamp = self.context.as_ref().and_then(|c| c.timestamp.as_deref());
        first_non_empty([
            timestamp,
            self.created_at.as_deref(),
            self.updated_at.as_deref(),
        ])
        .map(String::from)
    }

    /// Map to a canonical note. Filtering happens in [`extract_notes`].
    pub fn to_note(&self, fallback_millis: i64, position: usize) -> Note {
        let id = self.note_id(fallback_millis, position);

        let title_source =
            first_non_empty([self.title.as_deref(), self.text.as_deref(), self.caption.as_deref()])
                .unwrap_or_default();
        let title = truncate_chars(&normalize_text(title_source), TITLE_MAX_CHARS);
        let title = if title.is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            title
        };

        let excerpt_source =
            first_non_empty([self.text.as_deref(), self.caption.as_deref(), self.title.as_deref()])
                .unwrap_or_default();
        let excerpt = truncate_chars(&normalize_text(excerpt_source), EXCERPT_MAX_CHARS);

        let body = first_non_empty([
            self.html.as_deref(),
            self.body_html.as_deref(),
            self.text.as_deref(),
            self.caption.as_deref(),
        ])
        .unwrap_or_default()
        .to_string();

        Note {
            slug: note_slug(&title, &id),
            id,
            title,
            published_at: self.published_at(),
            excerpt,
            body,
            url: non_empty(self.url.as_deref()).map(String::from),
            raw_type: self.kind.as_deref().unwrap_or_default().to_string(),
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn first_non_empty<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates.into_iter().find_map(non_empty)
}

/// Fetch the raw feed body.
///
/// Sends `User-Agent` and `Accept: application/json`. Non-2xx responses are
/// errors; the body is returned untouched otherwise.
pub fn fetch_feed(config: &FeedConfig) -> Result<Vec<u8>, FetchError> {
    let mut builder = reqwest::blocking::Client::builder().user_agent(config.user_agent.as_str());
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    tracing::info!(url = %config.url, "fetching feed");
    let response = client
        .get(&config.url)
        .header(ACCEPT, "application/json")
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: config.url.clone(),
            status: status.as_u16(),
        });
    }
    Ok(response.bytes()?.to_vec())
}

/// Parse a feed body. A missing or null `items` key is an empty feed.
pub fn parse_feed(body: &[u8]) -> Result<Feed, FetchError> {
    Ok(serde_json::from_slice(body)?)
}

/// Filter to the configured author and allowed types, map to notes, sort
/// newest first.
///
/// `fallback_millis` seeds ids for items that carry neither `entity_key`
/// nor `id`.
pub fn extract_notes(feed: &Feed, config: &FeedConfig, fallback_millis: i64) -> Vec<Note> {
    let mut notes: Vec<Note> = feed
        .items
        .iter()
        .enumerate()
        .filter_map(|(position, value)| FeedItem::from_value(value).map(|item| (position, item)))
        .filter(|(_, item)| item.author_handle() == Some(config.author.as_str()))
        .filter(|(_, item)| {
            item.kind
                .as_deref()
                .is_some_and(|k| config.allowed_types.iter().any(|t| t == k))
        })
        .map(|(position, item)| item.to_note(fallback_millis, position))
        .collect();

    sort_notes(&mut notes);
    notes
}

/// Result of a fetch run, for display.
#[derive(Debug)]
pub struct FetchReport {
    pub raw_path: PathBuf,
    pub notes_path: PathBuf,
    /// Items in the feed before filtering.
    pub feed_items: usize,
    /// Kept notes in stored order.
    pub notes: Vec<Note>,
}

/// Run the whole fetch stage: request, persist raw, normalize, persist
/// the canonical collection.
///
/// Files land in `config.paths.data_dir`.
pub fn fetch(config: &SiteConfig) -> Result<FetchReport, FetchError> {
    let body = fetch_feed(&config.feed)?;
    store_feed(&body, config, chrono::Utc::now().timestamp_millis())
}

/// Persist an already fetched body and derive `notes.json` from it.
pub fn store_feed(
    body: &[u8],
    config: &SiteConfig,
    fallback_millis: i64,
) -> Result<FetchReport, FetchError> {
    fs::create_dir_all(&config.paths.data_dir)?;

    let raw_path = config.paths.raw_feed_path();
    fs::write(&raw_path, body)?;
    tracing::debug!(path = %raw_path.display(), bytes = body.len(), "wrote raw feed");

    let feed = parse_feed(body)?;
    let notes = extract_notes(&feed, &config.feed, fallback_millis);
    tracing::info!(
        feed_items = feed.items.len(),
        kept = notes.len(),
        author = %config.feed.author,
        "normalized feed"
    );

    let collection = NoteCollection::new(notes);
    let notes_path = config.paths.notes_path();
    fs::write(&notes_path, serde_json::to_string_pretty(&collection)?)?;

    Ok(FetchReport {
        raw_path,
        notes_path,
        feed_items: feed.items.len(),
        notes: collection.items,
    })
}
