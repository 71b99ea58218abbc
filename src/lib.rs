//! # Notes Mirror
//!
//! Mirrors one author's public notes feed into a small static site: an
//! index of notes, one page per note, a stylesheet and a light/dark theme
//! toggle.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! Each stage is a separate command and communicates only through a JSON
//! file on disk:
//!
//! ```text
//! 1. Fetch   feed URL        →  data/notes.json   (remote JSON → canonical notes)
//! 2. Render  data/notes.json →  public/           (canonical notes → HTML site)
//! ```
//!
//! `notes-mirror build` runs both. The persisted collection is
//! human-readable and hand-editable, and the renderer makes no assumptions
//! about who wrote it: it re-sorts and re-validates on every run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`feed`] | Stage 1: HTTP fetch, author/type filtering, mapping to [`note::Note`] |
//! | [`render`] | Stage 2: renders index and note pages with Maud, writes assets |
//! | [`note`] | The canonical `Note` record, sort order and date handling |
//! | [`text`] | Tag stripping, whitespace collapsing, slugs, truncation |
//! | [`incremental`] | SHA-256 comparison so unchanged files are not rewritten |
//! | [`config`] | Optional `notes-mirror.toml` loading and validation |
//! | [`output`] | CLI output formatting for both stages |
//!
//! # Design Decisions
//!
//! ## Full Regeneration, Hash-Gated Writes
//!
//! Every fetch replaces `notes.json` wholesale, and every render builds the
//! whole site in memory. There is no incremental merge to get wrong. Writes
//! are gated on a content hash so an unchanged note keeps its file untouched,
//! which keeps rsync/CDN uploads small.
//!
//! ## Trusted Note Bodies
//!
//! Titles and excerpts are stripped to plain text at fetch time and escaped
//! again at render time. The note body is the one field embedded as raw
//! HTML: the feed is a single trusted source and the body is the content.
//!
//! ## Explicit Paths
//!
//! Data and output directories come from config (default `data/` and
//! `public/`) or CLI flags and are passed down explicitly; nothing reads
//! the working directory behind the caller's back.

pub mod config;
pub mod feed;
pub mod incremental;
pub mod note;
pub mod output;
pub mod render;
pub mod text;

#[cfg(test)]
pub(crate) mod test_helpers;
