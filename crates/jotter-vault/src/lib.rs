//! # jotter-vault
//!
//! File system side of jotter: the posts folder.
//!
//! Post files are named `YYYY-MM-DD-<slugified-title>.md` and are the
//! authoring source; the post store is filled from them by the migrator.

pub mod now;
pub mod watcher;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use jotter_core::clock::Clock;
use jotter_core::error::{BlogError, Result};
use jotter_core::post::{ParsedPost, HEADER_DATE_FORMAT};
use jotter_parser::render_post;

pub use now::NowPage;
pub use watcher::{VaultEvent, VaultWatcher};

/// File extension of post files.
pub const POST_EXTENSION: &str = "md";

/// A folder of post files.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every post file in the folder, sorted by file name (and so by date).
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::Vault`] if the folder does not exist and
    /// [`BlogError::Io`] if it cannot be read.
    pub fn post_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(BlogError::Vault(format!(
                "posts folder {} does not exist",
                self.root.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file() && is_post_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Create a new, empty post file for `title`, dated by `clock`.
    ///
    /// The file holds only the header template; description and tags are
    /// left blank for the author to fill in. Returns the new file's path.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::MissingRequiredInput`] if no title is given,
    /// [`BlogError::Vault`] if the file already exists, and
    /// [`BlogError::Io`] if it cannot be written.
    pub fn create_post(&self, title: Option<&str>, clock: &dyn Clock) -> Result<PathBuf> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BlogError::MissingRequiredInput("Please specify post's title".to_string())
            })?;

        let slug = slug::slugify(title);
        if slug.is_empty() {
            return Err(BlogError::MissingRequiredInput(format!(
                "cannot derive a file name from title {title:?}"
            )));
        }

        let now = clock.now();
        let path = self
            .root
            .join(format!("{}-{slug}.{POST_EXTENSION}", now.format("%Y-%m-%d")));

        let template = render_post(&ParsedPost {
            layout: Some("post".to_string()),
            title: title.to_string(),
            date: now.format(HEADER_DATE_FORMAT).to_string(),
            ..ParsedPost::default()
        });

        fs::create_dir_all(&self.root)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    BlogError::Vault(format!("{} already exists", path.display()))
                }
                _ => BlogError::Io(e),
            })?;
        file.write_all(template.as_bytes())?;

        tracing::info!(path = %path.display(), "created post file");
        Ok(path)
    }
}

/// Whether `path` names a post file.
#[must_use]
pub fn is_post_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(POST_EXTENSION)
}
