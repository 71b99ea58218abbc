//! HTML site rendering.
//!
//! Stage 2 of the pipeline. Reads the canonical `notes.json` and writes the
//! static site.
//!
//! ## Generated Pages
//!
//! - **Index page** (`/index.html`): one card per note, newest first
//! - **Note pages** (`/notes/{slug}.html`): title, date, and the note body
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── index.html
//! ├── styles.css                 # Dark theme + `.light` overrides
//! ├── script.js                  # Theme toggle, persisted in localStorage
//! └── notes/
//!     ├── hello-world-c-42.html
//!     └── ...
//! ```
//!
//! Note pages whose note has disappeared from the collection are removed,
//! so the output always mirrors the current collection.
//!
//! ## Escaping and the Note Body
//!
//! Templates are [maud](https://maud.lambda.xyz/) markup, so every
//! interpolated title, excerpt, description and URL is escaped. The note
//! `body` is the exception: it is feed-supplied HTML and is embedded with
//! [`PreEscaped`]. The feed is a single trusted source; sanitizing it here
//! would be a deliberate scope change, not a fix.
//!
//! ## Determinism
//!
//! Output depends only on the collection and the config: no build
//! timestamps, no randomness. Files are written through
//! [`write_if_changed`], so re-rendering an unchanged collection touches
//! nothing on disk.

use crate::config::SiteMeta;
use crate::incremental::{WriteStatus, write_if_changed};
use crate::note::{Note, NoteCollection, format_date, sort_notes};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("note {id} has an unsafe slug: {slug:?}")]
    InvalidSlug { id: String, slug: String },
    #[error("more than one note has the slug {slug:?}")]
    DuplicateSlug { slug: String },
}

const CSS: &str = include_str!("../static/styles.css");
const JS: &str = include_str!("../static/script.js");

/// Read the canonical collection. A missing `items` key is an empty
/// collection; anything that is not JSON is an error.
pub fn load_collection(path: &Path) -> Result<NoteCollection, RenderError> {
    let content = fs::read_to_string(path).map_err(|source| RenderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Slugs become file names, so only `[a-z0-9-]` is accepted.
fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Check that every slug is safe to use as a file name and names exactly
/// one note.
pub fn validate_notes(notes: &[Note]) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    for note in notes {
        if !is_safe_slug(&note.slug) {
            return Err(RenderError::InvalidSlug {
                id: note.id.clone(),
                slug: note.slug.clone(),
            });
        }
        if !seen.insert(note.slug.as_str()) {
            return Err(RenderError::DuplicateSlug {
                slug: note.slug.clone(),
            });
        }
    }
    Ok(())
}

/// Site-absolute URL of a note page.
pub fn note_href(slug: &str) -> String {
    format!("/notes/{slug}.html")
}

/// Outcome of one written page, for display.
#[derive(Debug, Clone)]
pub struct PageWrite {
    pub title: String,
    /// Path relative to the output directory.
    pub path: String,
    pub status: WriteStatus,
}

/// Result of a render run, for display.
#[derive(Debug)]
pub struct RenderReport {
    pub output_dir: PathBuf,
    pub index: PageWrite,
    /// Note pages in index order.
    pub notes: Vec<PageWrite>,
    pub assets: Vec<PageWrite>,
    /// Stale note pages deleted, relative to the output directory.
    pub removed: Vec<String>,
}

impl RenderReport {
    /// Count of files actually rewritten.
    pub fn written(&self) -> usize {
        std::iter::once(&self.index)
            .chain(&self.notes)
            .chain(&self.assets)
            .filter(|p| p.status == WriteStatus::Written)
            .count()
    }
}

/// Render the site for the collection at `notes_path` into `output_dir`.
///
/// Input is fully loaded and checked before anything is written.
pub fn generate(
    site: &SiteMeta,
    notes_path: &Path,
    output_dir: &Path,
    force: bool,
) -> Result<RenderReport, RenderError> {
    let collection = load_collection(notes_path)?;
    let mut notes = collection.items;
    // The fetch stage sorts too, but the file may have been edited by hand.
    sort_notes(&mut notes);

    validate_notes(&notes)?;

    let notes_dir = output_dir.join("notes");
    fs::create_dir_all(&notes_dir)?;

    let index_html = render_index(&notes, site).into_string();
    let index = PageWrite {
        title: site.title.clone(),
        path: "index.html".to_string(),
        status: write_if_changed(&output_dir.join("index.html"), index_html.as_bytes(), force)?,
    };

    let mut pages = Vec::with_capacity(notes.len());
    for note in &notes {
        let file_name = format!("{}.html", note.slug);
        let page_html = render_note_page(note, site).into_string();
        let status = write_if_changed(&notes_dir.join(&file_name), page_html.as_bytes(), force)?;
        pages.push(PageWrite {
            title: note.title.clone(),
            path: format!("notes/{file_name}"),
            status,
        });
    }

    let mut assets = Vec::with_capacity(2);
    for (name, contents) in [("styles.css", CSS), ("script.js", JS)] {
        let status = write_if_changed(&output_dir.join(name), contents.as_bytes(), force)?;
        assets.push(PageWrite {
            title: name.to_string(),
            path: name.to_string(),
            status,
        });
    }

    let keep: HashSet<&str> = notes.iter().map(|n| n.slug.as_str()).collect();
    let removed = prune_stale_pages(&notes_dir, &keep)?;

    tracing::info!(
        notes = notes.len(),
        removed = removed.len(),
        output = %output_dir.display(),
        "rendered site"
    );

    Ok(RenderReport {
        output_dir: output_dir.to_path_buf(),
        index,
        notes: pages,
        assets,
        removed,
    })
}

/// Delete `notes/*.html` files whose slug is not in `keep`.
fn prune_stale_pages(notes_dir: &Path, keep: &HashSet<&str>) -> std::io::Result<Vec<String>> {
    let mut removed = Vec::new();
    for entry in fs::read_dir(notes_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().is_none_or(|e| e != "html") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !keep.contains(stem) {
            let name = format!("notes/{stem}.html");
            fs::remove_file(&path)?;
            tracing::debug!(page = %name, "removed stale page");
            removed.push(name);
        }
    }
    removed.sort();
    Ok(removed)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Head metadata for one page.
struct PageMeta<'a> {
    title: &'a str,
    description: &'a str,
    url: String,
}

/// Renders the base HTML document: head with social tags, header, footer.
fn base_document(page: &PageMeta, site: &SiteMeta, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" class="dark" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page.title) }
                meta name="description" content=(page.description);
                link rel="preconnect" href="https://fonts.gstatic.com" crossorigin;
                link href="https://fonts.googleapis.com/css2?family=Inter:wght@300;800&display=swap" rel="stylesheet";
                link rel="stylesheet" href="/styles.css";
                meta property="og:title" content=(page.title);
                meta property="og:description" content=(page.description);
                meta property="og:type" content="article";
                meta property="og:url" content=(page.url);
                meta name="twitter:card" content="summary_large_image";
                meta name="twitter:title" content=(page.title);
                meta name="twitter:description" content=(page.description);
            }
            body {
                (site_header(site))
                main.container { (content) }
                (site_footer())
                script src="/script.js" defer {}
            }
        }
    }
}

/// Brand link, home link, and the theme toggle button.
fn site_header(site: &SiteMeta) -> Markup {
    html! {
        header.site-header {
            div.container {
                a.brand href="/" { (site.title) }
                nav.nav {
                    a.nav-link href="/" { "All Notes" }
                    button.toggle id="themeToggle" aria-label="Toggle theme" { "◐" }
                }
            }
        }
    }
}

fn site_footer() -> Markup {
    html! {
        footer.site-footer {
            div.container {
                a href="/" { "← Back to all notes" }
            }
        }
    }
}

/// Renders a date as a `<time>` element; empty text when the date is
/// missing or unparsable.
fn note_time(note: &Note) -> Markup {
    html! {
        time.meta datetime=[note.published().map(|dt| dt.to_rfc3339())] {
            (format_date(note.published_at.as_deref()))
        }
    }
}

/// One index card: linked title, date, excerpt.
fn note_card(note: &Note) -> Markup {
    html! {
        article.card {
            h2.title {
                a href=(note_href(&note.slug)) { (note.title) }
            }
            (note_time(note))
            p.excerpt { (note.excerpt) }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the index page. `notes` are listed in the order given.
pub fn render_index(notes: &[Note], site: &SiteMeta) -> Markup {
    let page = PageMeta {
        title: &site.title,
        description: &site.description,
        url: format!("{}/", site.base_url),
    };

    let content = html! {
        section.grid {
            @for note in notes {
                (note_card(note))
            }
        }
    };

    base_document(&page, site, content)
}

/// Renders one note's detail page. The body goes in unescaped.
pub fn render_note_page(note: &Note, site: &SiteMeta) -> Markup {
    let page_title = format!("{} — {}", note.title, site.title);
    let description = if note.excerpt.is_empty() {
        &note.title
    } else {
        &note.excerpt
    };
    let page = PageMeta {
        title: &page_title,
        description,
        url: format!("{}{}", site.base_url, note_href(&note.slug)),
    };

    let content = html! {
        article.post {
            h1.post-title { (note.title) }
            (note_time(note))
            div.post-body { (PreEscaped(&note.body)) }
        }
    };

    base_document(&page, site, content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{note, read_tree, write_collection};
    use tempfile::TempDir;

    fn site() -> SiteMeta {
        SiteMeta::default()
    }

    // =========================================================================
    // Components
    // =========================================================================

    #[test]
    fn base_document_includes_doctype_and_theme_class() {
        let page = PageMeta {
            title: "T",
            description: "D",
            url: "https://example.com/".into(),
        };
        let doc = base_document(&page, &site(), html! { p { "x" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"<html lang="en" class="dark">"#));
        assert!(doc.contains(r#"href="/styles.css""#));
        assert!(doc.contains(r#"src="/script.js""#));
    }

    #[test]
    fn header_has_brand_and_toggle() {
        let header = site_header(&site()).into_string();
        assert!(header.contains("Notes by Emelie"));
        assert!(header.contains(r#"id="themeToggle""#));
        assert!(header.contains(r#"aria-label="Toggle theme""#));
    }

    #[test]
    fn footer_links_home() {
        let footer = site_footer().into_string();
        assert!(footer.contains(r#"href="/""#));
        assert!(footer.contains("Back to all notes"));
    }

    #[test]
    fn safe_slug_rules() {
        assert!(is_safe_slug("hello-world-c-42"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug("../etc/passwd"));
        assert!(!is_safe_slug("a/b"));
        assert!(!is_safe_slug("Upper"));
    }

    // =========================================================================
    // Index page
    // =========================================================================

    #[test]
    fn index_lists_cards_with_links() {
        let mut n = note("c-1", Some("2024-01-05T12:00:00Z"));
        n.title = "First".into();
        n.excerpt = "An excerpt".into();
        let html = render_index(&[n], &site()).into_string();
        assert!(html.contains(r#"href="/notes/c-1.html""#));
        assert!(html.contains(">First</a>"));
        assert!(html.contains(">Jan 5, 2024</time>"));
        assert!(html.contains("An excerpt"));
        assert!(html.contains("<title>Notes by Emelie</title>"));
        assert!(html.contains(r#"content="https://example.com/""#));
    }

    #[test]
    fn missing_date_renders_empty_time() {
        let html = render_index(&[note("c-1", None)], &site()).into_string();
        assert!(html.contains(r#"<time class="meta"></time>"#));
    }

    #[test]
    fn text_fields_are_escaped() {
        let mut n = note("c-1", None);
        n.title = r#"<script>alert("x") & co</script>"#.into();
        n.excerpt = "1 < 2 > 0".into();
        let html = render_index(&[n.clone()], &site()).into_string();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&quot;x&quot;) &amp; co&lt;/script&gt;"));
        assert!(html.contains("1 &lt; 2 &gt; 0"));

        let page = render_note_page(&n, &site()).into_string();
        assert!(!page.contains("<script>alert"));
        assert!(page.contains(
            "<title>&lt;script&gt;alert(&quot;x&quot;) &amp; co&lt;/script&gt; — Notes by Emelie</title>"
        ));
    }

    // =========================================================================
    // Note page
    // =========================================================================

    #[test]
    fn note_page_embeds_body_unescaped() {
        let mut n = note("c-1", Some("2024-03-01"));
        n.body = "<p>raw <b>html</b></p>".into();
        let html = render_note_page(&n, &site()).into_string();
        assert!(html.contains(r#"<div class="post-body"><p>raw <b>html</b></p></div>"#));
        assert!(html.contains(">Mar 1, 2024</time>"));
    }

    #[test]
    fn note_page_meta() {
        let mut n = note("hello-c-1", None);
        n.title = "Hello".into();
        n.excerpt = "Short".into();
        let html = render_note_page(&n, &site()).into_string();
        assert!(html.contains("<title>Hello — Notes by Emelie</title>"));
        assert!(html.contains(r#"content="https://example.com/notes/hello-c-1.html""#));
        assert!(html.contains(r#"<meta name="description" content="Short">"#));
    }

    #[test]
    fn note_page_description_falls_back_to_title() {
        let mut n = note("c-1", None);
        n.title = "Only a title".into();
        n.excerpt = String::new();
        let html = render_note_page(&n, &site()).into_string();
        assert!(html.contains(r#"<meta name="description" content="Only a title">"#));
    }

    // =========================================================================
    // generate()
    // =========================================================================

    #[test]
    fn generate_writes_full_site() {
        let tmp = TempDir::new().unwrap();
        let data = write_collection(tmp.path(), &[note("a", None), note("b", None)]);
        let out = tmp.path().join("public");

        let report = generate(&site(), &data, &out, false).unwrap();

        assert!(out.join("index.html").is_file());
        assert!(out.join("notes/a.html").is_file());
        assert!(out.join("notes/b.html").is_file());
        assert_eq!(fs::read_to_string(out.join("styles.css")).unwrap(), CSS);
        assert_eq!(fs::read_to_string(out.join("script.js")).unwrap(), JS);
        assert_eq!(report.notes.len(), 2);
        assert_eq!(report.written(), 5);
    }

    #[test]
    fn generate_resorts_input() {
        let tmp = TempDir::new().unwrap();
        let data = write_collection(
            tmp.path(),
            &[
                note("undated", None),
                note("old", Some("2023-01-01")),
                note("new", Some("2024-01-01")),
            ],
        );
        let out = tmp.path().join("public");
        generate(&site(), &data, &out, false).unwrap();

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        let pos = |slug: &str| index.find(&note_href(slug)).unwrap();
        assert!(pos("new") < pos("old"));
        assert!(pos("old") < pos("undated"));
    }

    #[test]
    fn generate_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let mut n = note("c-1", Some("2024-01-01"));
        n.body = "<p>body</p>".into();
        let data = write_collection(tmp.path(), &[n, note("c-2", None)]);

        let first_out = tmp.path().join("first");
        let second_out = tmp.path().join("second");
        generate(&site(), &data, &first_out, false).unwrap();
        generate(&site(), &data, &second_out, false).unwrap();

        assert_eq!(read_tree(&first_out), read_tree(&second_out));
    }

    #[test]
    fn generate_second_run_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let data = write_collection(tmp.path(), &[note("a", None)]);
        let out = tmp.path().join("public");
        generate(&site(), &data, &out, false).unwrap();
        let before = read_tree(&out);

        let report = generate(&site(), &data, &out, false).unwrap();
        assert_eq!(report.written(), 0);
        assert_eq!(read_tree(&out), before);

        let forced = generate(&site(), &data, &out, true).unwrap();
        assert_eq!(forced.written(), 4);
        assert_eq!(read_tree(&out), before);
    }

    #[test]
    fn generate_removes_stale_pages_only() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("public");
        fs::create_dir_all(out.join("notes")).unwrap();
        fs::write(out.join("notes/gone.html"), "old").unwrap();
        fs::write(out.join("notes/readme.txt"), "keep me").unwrap();

        let data = write_collection(tmp.path(), &[note("kept", None)]);
        let report = generate(&site(), &data, &out, false).unwrap();

        assert_eq!(report.removed, ["notes/gone.html"]);
        assert!(!out.join("notes/gone.html").exists());
        assert!(out.join("notes/readme.txt").exists());
        assert!(out.join("notes/kept.html").exists());
    }

    #[test]
    fn generate_missing_items_is_empty_site() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("notes.json");
        fs::write(&data, r#"{"count": 0}"#).unwrap();
        let out = tmp.path().join("public");

        let report = generate(&site(), &data, &out, false).unwrap();
        assert!(report.notes.is_empty());
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(!index.contains("<article"));
    }

    #[test]
    fn generate_malformed_input_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("notes.json");
        fs::write(&data, "{ not json").unwrap();
        let out = tmp.path().join("public");

        let result = generate(&site(), &data, &out, false);
        assert!(matches!(result, Err(RenderError::Json(_))));
        assert!(!out.exists());
    }

    #[test]
    fn generate_missing_input_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let result = generate(
            &site(),
            &tmp.path().join("absent.json"),
            &tmp.path().join("public"),
            false,
        );
        assert!(matches!(result, Err(RenderError::Read { .. })));
    }

    #[test]
    fn generate_rejects_path_like_slug() {
        let tmp = TempDir::new().unwrap();
        let mut n = note("x", None);
        n.slug = "../escape".into();
        let data = write_collection(tmp.path(), &[n]);
        let out = tmp.path().join("public");

        let result = generate(&site(), &data, &out, false);
        assert!(matches!(result, Err(RenderError::InvalidSlug { .. })));
        assert!(!out.exists());
        assert!(!tmp.path().join("escape.html").exists());
    }

    #[test]
    fn generate_rejects_duplicate_slug() {
        let tmp = TempDir::new().unwrap();
        let mut a = note("c.1", Some("2024-01-02"));
        let mut b = note("c-1", Some("2024-01-01"));
        a.slug = "hi-c-1".into();
        b.slug = "hi-c-1".into();
        let data = write_collection(tmp.path(), &[a, b]);
        let out = tmp.path().join("public");

        let result = generate(&site(), &data, &out, false);
        assert!(matches!(
            result,
            Err(RenderError::DuplicateSlug { ref slug }) if slug == "hi-c-1"
        ));
        assert!(!out.exists());
    }

    #[test]
    fn generate_null_items_is_empty_site() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("notes.json");
        fs::write(&data, r#"{"count": 0, "items": null}"#).unwrap();
        let out = tmp.path().join("public");

        let report = generate(&site(), &data, &out, false).unwrap();
        assert!(report.notes.is_empty());
        assert!(out.join("index.html").is_file());
    }
}
