//! Shared test utilities for the notes-mirror test suite.
//!
//! Provides a note builder, a collection writer, and a directory snapshot
//! for comparing rendered output byte for byte.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let data = write_collection(tmp.path(), &[note("c-1", Some("2024-01-01"))]);
//! generate(&SiteMeta::default(), &data, &tmp.path().join("out"), false).unwrap();
//! let snapshot = read_tree(&tmp.path().join("out"));
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::note::{Note, NoteCollection};

/// A minimal note whose id and slug are both `id`.
pub fn note(id: &str, published_at: Option<&str>) -> Note {
    Note {
        id: id.to_string(),
        slug: id.to_string(),
        title: format!("Title {id}"),
        published_at: published_at.map(String::from),
        excerpt: format!("Excerpt {id}"),
        body: format!("<p>Body {id}</p>"),
        url: None,
        raw_type: "note".to_string(),
    }
}

/// Write `notes` as `<dir>/notes.json` in stored order and return its path.
pub fn write_collection(dir: &Path, notes: &[Note]) -> PathBuf {
    let path = dir.join("notes.json");
    let collection = NoteCollection::new(notes.to_vec());
    std::fs::write(&path, serde_json::to_string_pretty(&collection).unwrap()).unwrap();
    path
}

/// Every file under `root`, keyed by relative path.
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    read_tree_recursive(root, root, &mut files);
    files
}

fn read_tree_recursive(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            read_tree_recursive(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
            files.insert(rel, std::fs::read(&path).unwrap());
        }
    }
}
