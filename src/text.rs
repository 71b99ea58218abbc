//! Plain-text helpers shared by the fetch stage.
//!
//! Feed items carry a mix of HTML and plain text. Titles and excerpts are
//! always stored as plain text, so they go through [`normalize_text`] before
//! anything else. Slugs are derived from those normalized titles.
//!
//! ## Normalization is lossy on purpose
//!
//! Tags are removed with a permissive `<[^>]+>` match, not an HTML parser.
//! The result is only ever displayed (and escaped on render), never parsed
//! again, so an approximation is enough:
//!
//! - `"<p>Hello <b>world</b></p>"` → `"Hello world"`
//! - `"line one\n\nline two"` → `"line one line two"`

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Strip tags, collapse whitespace runs to a single space, trim the edges.
pub fn normalize_text(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    WHITESPACE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Lowercase, replace every run of non `[a-z0-9]` characters with one
/// hyphen, and strip leading/trailing hyphens.
///
/// - `"Hello, World! 2024"` → `"hello-world-2024"`
/// - `"  --Ünïcode--  "` → `"n-code"`
/// - `"!!!"` → `""`
pub fn to_slug(s: &str) -> String {
    let lower = s.to_lowercase();
    NON_SLUG
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug for a note page: the slugified title followed by the slugified id.
///
/// The id keeps slugs unique across the collection. A title with no slug
/// characters at all falls back to the id alone, so the result never starts
/// with a hyphen.
pub fn note_slug(title: &str, id: &str) -> String {
    let title_part = to_slug(title);
    let id_part = to_slug(id);
    match (title_part.is_empty(), id_part.is_empty()) {
        (true, _) => id_part,
        (false, true) => title_part,
        (false, false) => format!("{title_part}-{id_part}"),
    }
}

/// Truncate to at most `max` characters (not bytes), dropping any trailing
/// whitespace left at the cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}
