//! Post store synchronizer: parsed post in, stored post out.

use jotter_core::error::{BlogError, Result};
use jotter_core::post::{content_hash, ParsedPost, PostChanges};
use jotter_core::repository::{PostRepository, Upserted};
use jotter_parser::parse_post;

/// Writes parsed posts into a [`PostRepository`], keyed by title.
pub struct PostSynchronizer<'a, R: PostRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: PostRepository + ?Sized> PostSynchronizer<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Upsert `parsed` by title, applying body, description, publication
    /// date and tags in one write.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::MissingRequiredInput`] for an empty title,
    /// [`BlogError::MalformedDocument`] for an unreadable date, and any
    /// storage error from the repository.
    pub fn sync(&self, parsed: &ParsedPost, source_hash: Option<String>) -> Result<Upserted> {
        if parsed.title.trim().is_empty() {
            return Err(BlogError::MissingRequiredInput(
                "post header has an empty title".to_string(),
            ));
        }

        let changes = PostChanges {
            body: parsed.body.clone(),
            description: parsed.description.clone(),
            created_at: parsed.published_at()?,
            tags: parsed.tags.clone(),
            source_hash,
        };

        self.repo.upsert_by_title(&parsed.title, &changes)
    }

    /// Parse a post file's text and sync it, recording the content hash.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::MalformedDocument`] if the text does not parse,
    /// otherwise as [`PostSynchronizer::sync`].
    pub fn ingest(&self, content: &str) -> Result<Upserted> {
        let parsed = parse_post(content)?;
        self.sync(&parsed, Some(content_hash(content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use jotter_core::clock::FixedClock;
    use jotter_core::error::DocumentError;
    use jotter_store::PostStore;

    const EXAMPLE: &str = "---
layout: post
title: Example Post
date: 2017-01-01 00:00:00
description: An example
tags: ruby, rails
---

Hello world.
";

    fn store() -> (PostStore, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2017, 1, 2, 0, 0, 0).unwrap(),
        ));
        (PostStore::in_memory_with_clock(clock.clone()).unwrap(), clock)
    }

    #[test]
    fn ingest_stores_parsed_fields() {
        let (store, _clock) = store();
        let sync = PostSynchronizer::new(&store);

        let upserted = sync.ingest(EXAMPLE).unwrap();
        assert!(upserted.created);

        let post = upserted.post;
        assert_eq!(post.title, "Example Post");
        assert_eq!(post.description, "An example");
        assert_eq!(post.tags, vec!["ruby", "rails"]);
        assert_eq!(post.body, "Hello world.\n");
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(post.source_hash, Some(content_hash(EXAMPLE)));
    }

    #[test]
    fn ingesting_twice_keeps_one_post_and_bumps_updated_at() {
        let (store, clock) = store();
        let sync = PostSynchronizer::new(&store);

        let first = sync.ingest(EXAMPLE).unwrap().post;
        clock.advance(Duration::minutes(1));
        let second = sync.ingest(EXAMPLE).unwrap();

        assert!(!second.created);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(second.post.id, first.id);
        assert!(second.post.updated_at > first.updated_at);
        assert_ne!(second.post.cache_key(), first.cache_key());
    }

    #[test]
    fn edited_file_updates_existing_post() {
        let (store, _clock) = store();
        let sync = PostSynchronizer::new(&store);

        sync.ingest(EXAMPLE).unwrap();
        let edited = EXAMPLE
            .replace("Hello world.", "Hello again.")
            .replace("tags: ruby, rails", "tags: rust");
        let post = sync.ingest(&edited).unwrap().post;

        assert_eq!(post.body, "Hello again.\n");
        assert_eq!(post.tags, vec!["rust"]);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn empty_title_is_missing_required_input() {
        let (store, _clock) = store();
        let sync = PostSynchronizer::new(&store);

        let err = sync
            .ingest("---\ntitle:\ndate: 2017-01-01 00:00:00\n---\n\nBody\n")
            .unwrap_err();
        assert!(matches!(err, BlogError::MissingRequiredInput(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn malformed_documents_never_reach_the_store() {
        let (store, _clock) = store();
        let sync = PostSynchronizer::new(&store);

        let err = sync.ingest("---\nlayout: post\n").unwrap_err();
        assert!(matches!(
            err,
            BlogError::MalformedDocument(DocumentError::MissingClosingDelimiter)
        ));

        let err = sync
            .ingest("---\ntitle: T\ndate: someday\n---\n\nBody\n")
            .unwrap_err();
        assert!(matches!(
            err,
            BlogError::MalformedDocument(DocumentError::InvalidDate(_))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }
}
