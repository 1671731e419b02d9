//! # jotter-store
//!
//! SQLite post store for jotter.
//!
//! Holds the published posts:
//! - `posts` table keyed by title, with a unique slug assigned on insert
//! - `post_tags` table keeping each post's tags in header order
//! - RFC 3339 timestamps with microsecond precision

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use jotter_core::clock::{Clock, SystemClock};
use jotter_core::error::{BlogError, Result};
use jotter_core::post::{Post, PostChanges};
use jotter_core::repository::{PostRepository, Upserted};

const POST_COLUMNS: &str =
    "id, title, slug, description, body, created_at, updated_at, source_hash";

/// The PostStore manages the SQLite post database.
pub struct PostStore {
    conn: Connection,
    clock: Arc<dyn Clock>,
}

impl PostStore {
    /// Open or create a post database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::StorageUnavailable`] if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open or create a post database stamping writes with `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::StorageUnavailable`] if the database cannot be opened.
    pub fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| BlogError::StorageUnavailable(format!("{}: {e}", path.display())))?;
        let store = Self { conn, clock };
        store.create_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::StorageUnavailable`] if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    /// Create an in-memory store stamping writes with `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::StorageUnavailable`] if schema creation fails.
    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BlogError::StorageUnavailable(e.to_string()))?;
        let store = Self { conn, clock };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                source_hash TEXT
            );

            CREATE TABLE IF NOT EXISTS post_tags (
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY (post_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at);
            CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag);
            ",
            )
            .map_err(|e| BlogError::StorageUnavailable(e.to_string()))?;

        Ok(())
    }

    /// Look a post up by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::PersistenceFailure`] if the query fails.
    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.find_one("slug", slug)
    }

    /// All posts, newest first by publication date.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::PersistenceFailure`] if the query fails.
    pub fn newest_first(&self) -> Result<Vec<Post>> {
        self.query_posts(
            &format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC"),
            &[],
        )
    }

    /// Posts carrying `tag`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::PersistenceFailure`] if the query fails.
    pub fn tagged(&self, tag: &str) -> Result<Vec<Post>> {
        self.query_posts(
            &format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE id IN (SELECT post_id FROM post_tags WHERE tag = ?1)
                 ORDER BY created_at DESC, id DESC"
            ),
            &[&tag],
        )
    }

    /// Every tag with the number of posts carrying it, by tag name.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::PersistenceFailure`] if the query fails.
    pub fn tag_counts(&self) -> Result<Vec<TagCount>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT tag, COUNT(DISTINCT post_id) FROM post_tags
                 GROUP BY tag
                 ORDER BY tag",
            )
            .map_err(persistence)?;

        let counts = stmt
            .query_map([], |row| {
                let posts: i64 = row.get(1)?;
                Ok(TagCount {
                    tag: row.get(0)?,
                    posts: posts as u64,
                })
            })
            .map_err(persistence)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(persistence)?;

        Ok(counts)
    }

    /// Get count of stored posts.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::PersistenceFailure`] if the query fails.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .map_err(persistence)?;
        Ok(count as u64)
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<Post>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE {column} = ?1"),
                params![value],
                RawPost::from_row,
            )
            .optional()
            .map_err(persistence)?;

        raw.map(|raw| raw.into_post(&self.conn)).transpose()
    }

    fn query_posts(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Post>> {
        let mut stmt = self.conn.prepare(sql).map_err(persistence)?;
        let raws = stmt
            .query_map(args, RawPost::from_row)
            .map_err(persistence)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(persistence)?;

        raws.into_iter()
            .map(|raw| raw.into_post(&self.conn))
            .collect()
    }

    /// The next `updated_at` for a post last written at `previous`:
    /// the clock's time, or one microsecond past `previous` if the clock
    /// has not moved beyond it.
    fn next_updated_at(&self, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = self.clock.now().trunc_subsecs(6);
        match previous {
            Some(previous) if now <= previous => previous + Duration::microseconds(1),
            _ => now,
        }
    }
}

impl PostRepository for PostStore {
    fn find_by_title(&self, title: &str) -> Result<Option<Post>> {
        self.find_one("title", title)
    }

    fn upsert_by_title(&self, title: &str, changes: &PostChanges) -> Result<Upserted> {
        if title.trim().is_empty() {
            return Err(BlogError::MissingRequiredInput(
                "post title must not be empty".to_string(),
            ));
        }

        let tx = self.conn.unchecked_transaction().map_err(persistence)?;

        let existing: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, updated_at FROM posts WHERE title = ?1",
                params![title],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(persistence)?;

        let created_at = format_timestamp(changes.created_at.trunc_subsecs(6));
        let (id, created) = match existing {
            Some((id, previous)) => {
                let updated_at = self.next_updated_at(Some(parse_timestamp(&previous)?));
                tx.execute(
                    "UPDATE posts
                     SET body = ?1, description = ?2, created_at = ?3,
                         updated_at = ?4, source_hash = ?5
                     WHERE id = ?6",
                    params![
                        changes.body,
                        changes.description,
                        created_at,
                        format_timestamp(updated_at),
                        changes.source_hash,
                        id,
                    ],
                )
                .map_err(persistence)?;
                (id, false)
            }
            None => {
                let slug = unique_slug(&tx, title)?;
                let updated_at = self.next_updated_at(None);
                tx.execute(
                    "INSERT INTO posts
                     (title, slug, description, body, created_at, updated_at, source_hash)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        title,
                        slug,
                        changes.description,
                        changes.body,
                        created_at,
                        format_timestamp(updated_at),
                        changes.source_hash,
                    ],
                )
                .map_err(persistence)?;
                (tx.last_insert_rowid(), true)
            }
        };

        tx.execute("DELETE FROM post_tags WHERE post_id = ?1", params![id])
            .map_err(persistence)?;
        for (position, tag) in changes.tags.iter().enumerate() {
            tx.execute(
                "INSERT INTO post_tags (post_id, position, tag) VALUES (?1, ?2, ?3)",
                params![id, position as i64, tag],
            )
            .map_err(persistence)?;
        }

        let post = tx
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                RawPost::from_row,
            )
            .map_err(persistence)?
            .into_post(&tx)?;

        tx.commit().map_err(persistence)?;

        tracing::info!(id = post.id, title = %post.title, created, "stored post");
        Ok(Upserted { post, created })
    }
}

/// A tag and how many posts carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub posts: u64,
}

/// A post row before its timestamps are parsed and tags attached.
struct RawPost {
    id: i64,
    title: String,
    slug: String,
    description: String,
    body: String,
    created_at: String,
    updated_at: String,
    source_hash: Option<String>,
}

impl RawPost {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            body: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            source_hash: row.get(7)?,
        })
    }

    fn into_post(self, conn: &Connection) -> Result<Post> {
        Ok(Post {
            tags: load_tags(conn, self.id)?,
            id: self.id,
            title: self.title,
            slug: self.slug,
            description: self.description,
            body: self.body,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            source_hash: self.source_hash,
        })
    }
}

fn load_tags(conn: &Connection, post_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT tag FROM post_tags WHERE post_id = ?1 ORDER BY position")
        .map_err(persistence)?;
    let tags = stmt
        .query_map(params![post_id], |row| row.get(0))
        .map_err(persistence)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(persistence)?;
    Ok(tags)
}

/// Slugify `title`, suffixing `-2`, `-3`, ... until no other post uses it.
fn unique_slug(conn: &Connection, title: &str) -> Result<String> {
    let base = slug::slugify(title);
    if base.is_empty() {
        return Err(BlogError::MissingRequiredInput(format!(
            "cannot derive a slug from title {title:?}"
        )));
    }

    let mut candidate = base.clone();
    let mut suffix = 2;
    loop {
        let taken = conn
            .query_row(
                "SELECT 1 FROM posts WHERE slug = ?1",
                params![candidate],
                |_| Ok(()),
            )
            .optional()
            .map_err(persistence)?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BlogError::PersistenceFailure(format!("bad timestamp {raw:?}: {e}")))
}

fn persistence(e: rusqlite::Error) -> BlogError {
    BlogError::PersistenceFailure(e.to_string())
}
