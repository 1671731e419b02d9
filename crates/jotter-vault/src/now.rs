//! The "now" page: a single markdown file served as-is, versioned by mtime.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use jotter_core::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPage {
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

impl NowPage {
    /// Read the page body and its modification time.
    ///
    /// # Errors
    ///
    /// Returns [`jotter_core::BlogError::Io`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path)?;
        let updated_at = fs::metadata(path)?.modified()?.into();
        Ok(Self { body, updated_at })
    }

    /// Cache key: `now/<mtime>`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("now/{}", self.updated_at.format("%Y%m%d%H%M%S%6f"))
    }
}
