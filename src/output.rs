//! CLI output formatting for both stages.
//!
//! Output is **information-first**: each note leads with its positional
//! index and title, with slugs, dates and file status as secondary context.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Feed: 42 items, 3 notes by emelieseveryday
//! 001 Morning pages
//!     Slug: morning-pages-c-12
//!     Published: Mar 1, 2024
//! 002 Note
//!     Slug: note-c-9
//!     Published: (none)
//! Saved data/notes.json (raw: data/notes_raw.json)
//! ```
//!
//! ## Render
//!
//! ```text
//! Home → index.html (written)
//! 001 Morning pages → notes/morning-pages-c-12.html (unchanged)
//! Assets → styles.css (unchanged), script.js (unchanged)
//! Removed notes/old-c-1.html
//! Rendered 3 notes into public (1 written, 5 unchanged)
//! ```
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::feed::FetchReport;
use crate::note::format_date;
use crate::render::RenderReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Fetch output
// ============================================================================

/// Format fetch stage output: feed size, kept notes, written files.
pub fn format_fetch_output(report: &FetchReport, author: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "Feed: {} items, {} notes by {}",
        report.feed_items,
        report.notes.len(),
        author
    )];

    for (i, note) in report.notes.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), note.title));
        lines.push(format!("{}Slug: {}", indent(1), note.slug));
        let published = format_date(note.published_at.as_deref());
        let published = if published.is_empty() {
            "(none)".to_string()
        } else {
            published
        };
        lines.push(format!("{}Published: {}", indent(1), published));
    }

    lines.push(format!(
        "Saved {} (raw: {})",
        report.notes_path.display(),
        report.raw_path.display()
    ));
    lines
}

/// Print fetch output to stdout.
pub fn print_fetch_output(report: &FetchReport, author: &str) {
    for line in format_fetch_output(report, author) {
        println!("{}", line);
    }
}

// ============================================================================
// Render output
// ============================================================================

/// Format render stage output: each page with its write status.
pub fn format_render_output(report: &RenderReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Home \u{2192} {} ({})",
        report.index.path, report.index.status
    )];

    for (i, page) in report.notes.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {} ({})",
            format_index(i + 1),
            page.title,
            page.path,
            page.status
        ));
    }

    let assets: Vec<String> = report
        .assets
        .iter()
        .map(|a| format!("{} ({})", a.path, a.status))
        .collect();
    lines.push(format!("Assets \u{2192} {}", assets.join(", ")));

    for removed in &report.removed {
        lines.push(format!("Removed {}", removed));
    }

    let total = 1 + report.notes.len() + report.assets.len();
    let written = report.written();
    lines.push(format!(
        "Rendered {} notes into {} ({} written, {} unchanged)",
        report.notes.len(),
        report.output_dir.display(),
        written,
        total - written
    ));
    lines
}

/// Print render output to stdout.
pub fn print_render_output(report: &RenderReport) {
    for line in format_render_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
