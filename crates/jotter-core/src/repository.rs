//! Storage interface the synchronizer writes through.

use crate::error::Result;
use crate::post::{Post, PostChanges};

/// Result of an upsert: the stored post and whether it was newly inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub post: Post,
    pub created: bool,
}

/// A persistent post collection keyed by title.
///
/// Implementations must apply [`PostRepository::upsert_by_title`] as a single
/// atomic write: a new post is inserted with all changes, or an existing one
/// is updated with all changes, and `updated_at` moves strictly forward.
/// Concurrent upserts of the same title are last-write-wins.
pub trait PostRepository {
    /// Look a post up by its exact title.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BlogError::PersistenceFailure`] if the read fails.
    fn find_by_title(&self, title: &str) -> Result<Option<Post>>;

    /// Find the post with `title`, or build a new one, then apply `changes`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BlogError::MissingRequiredInput`] for an empty title
    /// and [`crate::BlogError::PersistenceFailure`] if the write fails.
    fn upsert_by_title(&self, title: &str, changes: &PostChanges) -> Result<Upserted>;
}
