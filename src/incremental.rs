//! Content-hash comparison for incremental page writes.
//!
//! Every render produces the full site in memory, deterministically. Before
//! writing a file we compare the SHA-256 of the new contents with the
//! SHA-256 of what is already on disk and skip the write when they match.
//! The bytes on disk are therefore identical to a full rewrite; only file
//! modification times (and the write report) differ.
//!
//! Hashing instead of comparing mtimes keeps this correct across
//! `git checkout` and `rsync`, which reset modification times.
//!
//! Pass `--force` to `render`/`build` to skip the comparison and rewrite
//! everything.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::Path;

/// What happened to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// New file, or contents differed.
    Written,
    /// Already up to date on disk.
    Unchanged,
}

impl fmt::Display for WriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStatus::Written => f.write_str("written"),
            WriteStatus::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// SHA-256 of a byte slice as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of a file's contents, `None` if the file does not exist.
pub fn hash_file(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(hash_bytes(&bytes))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write `contents` to `path` unless an identical file is already there.
///
/// With `force`, always writes.
pub fn write_if_changed(path: &Path, contents: &[u8], force: bool) -> io::Result<WriteStatus> {
    if !force && hash_file(path)?.as_deref() == Some(hash_bytes(contents).as_str()) {
        tracing::trace!(path = %path.display(), "unchanged");
        return Ok(WriteStatus::Unchanged);
    }
    std::fs::write(path, contents)?;
    tracing::trace!(path = %path.display(), bytes = contents.len(), "written");
    Ok(WriteStatus::Written)
}
