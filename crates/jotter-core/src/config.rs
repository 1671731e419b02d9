//! Configuration loaded from `jotter.toml`.
//!
//! ```toml
//! database = "jotter.db"
//! posts_dir = "posts"
//! now_page = "data/now.md"
//!
//! [migrate]
//! on_error = "continue"
//!
//! [cdn]
//! max_age = 86400
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::error::BlogError;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "jotter.toml";

/// Top-level configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    /// SQLite database holding the posts.
    pub database: PathBuf,
    /// Folder of `YYYY-MM-DD-<slug>.md` post files.
    pub posts_dir: PathBuf,
    /// Markdown file backing the "now" page.
    pub now_page: PathBuf,
    pub migrate: MigrateConfig,
    pub cdn: CachePolicy,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("jotter.db"),
            posts_dir: PathBuf::from("posts"),
            now_page: PathBuf::from("data/now.md"),
            migrate: MigrateConfig::default(),
            cdn: CachePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateConfig {
    pub on_error: ErrorPolicy,
}

/// What a batch migration does when one file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Stop at the first failing file.
    #[default]
    FailFast,
    /// Record the failure and move on to the next file.
    Continue,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail-fast" => Ok(Self::FailFast),
            "continue" => Ok(Self::Continue),
            other => Err(format!(
                "unknown error policy '{other}' (expected 'fail-fast' or 'continue')"
            )),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => f.write_str("fail-fast"),
            Self::Continue => f.write_str("continue"),
        }
    }
}

impl BlogConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::Config`] if the text is not valid config TOML.
    pub fn from_toml(text: &str) -> Result<Self, BlogError> {
        toml::from_str(text).map_err(|e| BlogError::Config(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
    /// the working directory is used when present, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::Config`] if the file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, BlogError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = std::fs::read_to_string(&path)
            .map_err(|e| BlogError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }
}
