//! Post types: the parsed flat-file record and the persisted entity.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::DocumentError;

/// Date layout used in post headers, e.g. `2017-01-01 00:00:00`.
pub const HEADER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A blog post as stored. `title` is the upsert key; `slug` is assigned once
/// on first ingestion and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

/// Structured fields pulled out of a post file's header and body.
///
/// `date` stays raw: the parser does not validate it. Use
/// [`ParsedPost::published_at`] to get a timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    pub title: String,
    pub date: String,
    pub description: String,
    pub tags: Vec<String>,
    pub body: String,
    /// Header keys jotter does not interpret, in key order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ParsedPost {
    /// The header date as a UTC timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidDate`] if the date matches none of the
    /// accepted layouts.
    pub fn published_at(&self) -> Result<DateTime<Utc>, DocumentError> {
        parse_post_date(&self.date)
    }
}

/// The fields one ingestion writes onto a post, applied together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub body: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub source_hash: Option<String>,
}

/// Parse a header date.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` (read as UTC), the same with a trailing
/// numeric offset, RFC 3339, and a bare `YYYY-MM-DD` (midnight UTC).
///
/// # Errors
///
/// Returns [`DocumentError::InvalidDate`] for anything else.
pub fn parse_post_date(raw: &str) -> Result<DateTime<Utc>, DocumentError> {
    let raw = raw.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, HEADER_DATE_FORMAT) {
        return Ok(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(DocumentError::InvalidDate(raw.to_string()))
}

/// SHA-256 of raw file content, lowercase hex.
#[must_use]
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}
