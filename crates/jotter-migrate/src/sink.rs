//! Progress reporting for batch migrations.

use std::io::{self, Write};
use std::path::Path;

use jotter_core::error::BlogError;
use jotter_core::post::Post;

/// Receives one notification before and one after each file.
pub trait ProgressSink {
    /// About to migrate `path`.
    fn started(&mut self, path: &Path) -> io::Result<()>;

    /// `path` was stored as `post`.
    fn migrated(&mut self, path: &Path, post: &Post) -> io::Result<()>;

    /// `path` could not be migrated.
    fn failed(&mut self, path: &Path, error: &BlogError) -> io::Result<()>;
}

/// Writes plain progress lines:
///
/// ```text
/// Migrating posts/2017-01-01-example-post.md
/// Post#<id: 1, title: Example Post>
/// ```
pub struct WriterSink<W: Write> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressSink for WriterSink<W> {
    fn started(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out, "Migrating {}", path.display())
    }

    fn migrated(&mut self, _path: &Path, post: &Post) -> io::Result<()> {
        writeln!(self.out, "Post#<id: {}, title: {}>", post.id, post.title)
    }

    fn failed(&mut self, path: &Path, error: &BlogError) -> io::Result<()> {
        writeln!(self.out, "Failed {}: {error}", path.display())
    }
}

/// Reports progress as tracing events.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn started(&mut self, path: &Path) -> io::Result<()> {
        tracing::info!(path = %path.display(), "migrating");
        Ok(())
    }

    fn migrated(&mut self, path: &Path, post: &Post) -> io::Result<()> {
        tracing::info!(path = %path.display(), id = post.id, title = %post.title, "migrated");
        Ok(())
    }

    fn failed(&mut self, path: &Path, error: &BlogError) -> io::Result<()> {
        tracing::error!(path = %path.display(), error = %error, "migration failed");
        Ok(())
    }
}
