//! Configuration for the fetch and render stages.
//!
//! Everything has a default that reproduces the original fixed setup, so the
//! config file is optional. When present it is sparse: override only what
//! you need.
//!
//! ## Config File
//!
//! `notes-mirror.toml` in the working directory (or `--config <path>`):
//!
//! ```toml
//! [feed]
//! url = "https://emelieseveryday.substack.com/api/v1/notes?limit=100"
//! author = "emelieseveryday"       # Exact handle match on context.users[0]
//! user_agent = "Mozilla/5.0"
//! allowed_types = ["note", "text", "image", "link", "doc", "paragraph"]
//! # timeout_secs = 30             # Omit to use the HTTP client's default
//!
//! [site]
//! title = "Notes by Emelie"
//! description = "A minimalist mirror of Substack Notes."
//! base_url = "https://example.com" # Used for og:url; no trailing slash
//!
//! [paths]
//! data_dir = "data"                # notes_raw.json, notes.json
//! output_dir = "public"            # Rendered site
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where the notes come from and which of them to keep.
    pub feed: FeedConfig,
    /// Site-wide labels used in page heads and the header.
    pub site: SiteMeta,
    /// Data and output directories.
    pub paths: PathsConfig,
}

impl SiteConfig {
    /// Validate values and normalize `site.base_url`.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if !is_http_url(&self.feed.url) {
            return Err(ConfigError::Validation(
                "feed.url must be an http(s) URL".into(),
            ));
        }
        if self.feed.author.trim().is_empty() {
            return Err(ConfigError::Validation(
                "feed.author must not be empty".into(),
            ));
        }
        if self.feed.allowed_types.is_empty() {
            return Err(ConfigError::Validation(
                "feed.allowed_types must not be empty".into(),
            ));
        }
        if self.feed.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "feed.timeout_secs must be greater than zero".into(),
            ));
        }
        if !is_http_url(&self.site.base_url) {
            return Err(ConfigError::Validation(
                "site.base_url must be an http(s) URL".into(),
            ));
        }
        self.site.base_url = self.site.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Feed source and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    /// Endpoint returning `{ "items": [...] }`.
    pub url: String,
    /// Only items whose first context user has exactly this handle are kept.
    pub author: String,
    pub user_agent: String,
    /// Item `type` values to keep; everything else is dropped.
    pub allowed_types: Vec<String>,
    /// Request timeout. `None` leaves the HTTP client's default in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "https://emelieseveryday.substack.com/api/v1/notes?limit=100".into(),
            author: "emelieseveryday".into(),
            user_agent: "Mozilla/5.0".into(),
            allowed_types: ["note", "text", "image", "link", "doc", "paragraph"]
                .into_iter()
                .map(String::from)
                .collect(),
            timeout_secs: None,
        }
    }
}

/// Site-wide labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Brand in the header, `<title>` of the index, suffix of note titles.
    pub title: String,
    /// Index page description meta.
    pub description: String,
    /// Absolute origin for `og:url`, without trailing slash.
    pub base_url: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Notes by Emelie".into(),
            description: "A minimalist mirror of Substack Notes.".into(),
            base_url: "https://example.com".into(),
        }
    }
}

/// Data and output directories, relative to the working directory unless
/// absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("public"),
        }
    }
}

impl PathsConfig {
    /// Raw feed response, written verbatim.
    pub fn raw_feed_path(&self) -> PathBuf {
        self.data_dir.join("notes_raw.json")
    }

    /// Canonical collection consumed by the render stage.
    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join("notes.json")
    }
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = toml::from_str(content)?;
    config.validate()
}

/// Load config from `path`, falling back to stock defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return SiteConfig::default().validate();
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// A documented config file with every option at its default value.
pub fn stock_config_toml() -> &'static str {
    r#"# notes-mirror configuration
# All options are optional; the values below are the defaults.

[feed]
# Endpoint returning { "items": [...] }
url = "https://emelieseveryday.substack.com/api/v1/notes?limit=100"
# Keep only items whose first context user has exactly this handle
author = "emelieseveryday"
# Sent as the User-Agent header
user_agent = "Mozilla/5.0"
# Item types to keep; everything else is dropped
allowed_types = ["note", "text", "image", "link", "doc", "paragraph"]
# Request timeout in seconds; omit to use the HTTP client's default
# timeout_secs = 30

[site]
# Header brand, index <title>, and suffix of note page titles
title = "Notes by Emelie"
# Index page description
description = "A minimalist mirror of Substack Notes."
# Absolute origin used for og:url (no trailing slash)
base_url = "https://example.com"

[paths]
# notes_raw.json and notes.json are written here
data_dir = "data"
# The rendered site is written here
output_dir = "public"
"#
}
