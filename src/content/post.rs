//! Post models

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::toc::Heading;
use super::FrontMatter;
use crate::config::MetadataDefaults;

lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r"[^a-z0-9\s-]").expect("valid identifier regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
    static ref DASH_RUNS: Regex = Regex::new(r"-+").expect("valid dash regex");
}

/// Listing data for a post: everything but the body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    /// File name without extension; the public routing key
    pub id: String,
    pub title: String,
    /// Sortable date string, compared lexicographically
    pub date: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl PostMetadata {
    /// Apply placeholders for every field the header leaves out
    pub fn from_front_matter(id: &str, fm: FrontMatter, defaults: &MetadataDefaults) -> Self {
        let date = fm.date.filter(|d| !d.trim().is_empty()).unwrap_or_else(|| {
            tracing::warn!(
                "Post \"{}\" has no date, using the current time; listing order will change on every build",
                id
            );
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        });

        Self {
            id: id.to_string(),
            title: fm
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| defaults.title.clone()),
            date,
            excerpt: fm.excerpt.unwrap_or_default(),
            tags: fm.tags,
            author: fm
                .author
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| defaults.author.clone()),
            cover: fm.cover,
        }
    }
}

/// A single post with its rendered body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    #[serde(flatten)]
    pub meta: PostMetadata,
    /// Markdown source as stored, without the header
    #[serde(skip)]
    pub raw: String,
    pub content_html: String,
    /// Table of contents
    pub headings: Vec<Heading>,
}

impl PostData {
    /// Document metadata for the post's page
    pub fn page_meta(&self, site_title: &str) -> PageMeta {
        let description = if self.meta.excerpt.is_empty() {
            format!("Read {} on {}", self.meta.title, site_title)
        } else {
            self.meta.excerpt.clone()
        };

        PageMeta {
            title: format!("{} | {}", self.meta.title, site_title),
            description,
            published_time: Some(self.meta.date.clone()),
            authors: vec![self.meta.author.clone()],
            tags: self.meta.tags.clone(),
        }
    }
}

/// Title, description and article details for a rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_time: Option<String>,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
}

impl PageMeta {
    /// Metadata for the page shown when a post does not exist
    pub fn not_found(site_title: &str) -> Self {
        Self {
            title: format!("Post Not Found | {}", site_title),
            description: "The requested blog post could not be found.".to_string(),
            published_time: None,
            authors: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// Turn a human title into a URL-safe identifier
///
/// Lowercases, drops everything but ASCII letters, digits, whitespace and
/// hyphens, then joins words with single hyphens. May return an empty string
/// for titles with no ASCII letters or digits.
pub fn sanitize_identifier(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(kept.trim(), "-");
    let collapsed = DASH_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Whether a file stem can be read back as a post: a single file name
/// directly inside the store
pub fn is_stored_identifier(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains("..")
        && !id.chars().any(|c| matches!(c, '/' | '\\' | '\0'))
}

/// Whether `id` can name a new file in the flat content store and appear in a URL
pub fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !id.contains("..")
}
