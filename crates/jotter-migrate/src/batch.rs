//! Batch migration of post files into the store.
//!
//! Files are processed strictly in the order given, one at a time. There is
//! no retry; what happens after a failure is decided by [`ErrorPolicy`].

use std::fs;
use std::path::{Path, PathBuf};

use jotter_core::config::ErrorPolicy;
use jotter_core::error::{BlogError, Result};
use jotter_core::repository::PostRepository;

use crate::sink::ProgressSink;
use crate::sync::PostSynchronizer;

/// A file that made it into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedPost {
    pub path: PathBuf,
    pub id: i64,
    pub title: String,
    pub created: bool,
}

/// A file that did not, under [`ErrorPolicy::Continue`].
#[derive(Debug)]
pub struct FailedPost {
    pub path: PathBuf,
    pub error: BlogError,
}

/// Outcome of a batch run, in input order.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub migrated: Vec<MigratedPost>,
    pub failed: Vec<FailedPost>,
}

impl MigrationReport {
    /// True when every file migrated.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.migrated.len() + self.failed.len()
    }
}

/// Feeds post files through the parser and synchronizer.
pub struct Migrator<'a, R: PostRepository + ?Sized> {
    sync: PostSynchronizer<'a, R>,
    policy: ErrorPolicy,
}

impl<'a, R: PostRepository + ?Sized> Migrator<'a, R> {
    pub fn new(repo: &'a R, policy: ErrorPolicy) -> Self {
        Self {
            sync: PostSynchronizer::new(repo),
            policy,
        }
    }

    /// Migrate `paths` in order, reporting each file to `sink`.
    ///
    /// # Errors
    ///
    /// Under [`ErrorPolicy::FailFast`], returns [`BlogError::Aborted`] for the
    /// first file that fails. Under either policy, a failure to write to the
    /// sink is returned as [`BlogError::Io`].
    pub fn run<P: AsRef<Path>>(
        &self,
        paths: &[P],
        sink: &mut dyn ProgressSink,
    ) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        for path in paths {
            let path = path.as_ref();
            sink.started(path)?;

            let outcome = fs::read_to_string(path)
                .map_err(BlogError::from)
                .and_then(|content| self.sync.ingest(&content));

            match outcome {
                Ok(upserted) => {
                    sink.migrated(path, &upserted.post)?;
                    report.migrated.push(MigratedPost {
                        path: path.to_path_buf(),
                        id: upserted.post.id,
                        title: upserted.post.title,
                        created: upserted.created,
                    });
                }
                Err(error) => {
                    sink.failed(path, &error)?;
                    match self.policy {
                        ErrorPolicy::FailFast => {
                            return Err(BlogError::Aborted {
                                path: path.to_path_buf(),
                                source: Box::new(error),
                            });
                        }
                        ErrorPolicy::Continue => {
                            tracing::warn!(path = %path.display(), error = %error, "skipping post");
                            report.failed.push(FailedPost {
                                path: path.to_path_buf(),
                                error,
                            });
                        }
                    }
                }
            }
        }

        tracing::info!(
            migrated = report.migrated.len(),
            failed = report.failed.len(),
            "migration finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use jotter_core::clock::FixedClock;
    use jotter_core::error::DocumentError;
    use jotter_core::post::Post;
    use jotter_store::PostStore;
    use tempfile::TempDir;

    use crate::sink::{TracingSink, WriterSink};

    fn post_file(title: &str, date: &str, body: &str) -> String {
        format!(
            "---\nlayout: post\ntitle: {title}\ndate: {date}\ndescription:\ntags:\n---\n\n{body}\n"
        )
    }

    fn write_posts(files: &[(&str, String)]) -> (TempDir, Vec<PathBuf>) {
        let dir = TempDir::new().unwrap();
        let paths = files
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect();
        (dir, paths)
    }

    fn store() -> PostStore {
        let clock = Arc::new(FixedClock::at(
            Utc.with_ymd_and_hms(2017, 6, 1, 0, 0, 0).unwrap(),
        ));
        PostStore::in_memory_with_clock(clock).unwrap()
    }

    #[test]
    fn migrates_files_in_order_and_reports_progress() {
        let (_dir, paths) = write_posts(&[
            ("2017-01-01-first.md", post_file("First", "2017-01-01 00:00:00", "One.")),
            ("2017-01-02-second.md", post_file("Second", "2017-01-02 00:00:00", "Two.")),
        ]);
        let store = store();
        let mut sink = WriterSink::new(Vec::new());

        let report = Migrator::new(&store, ErrorPolicy::FailFast)
            .run(&paths, &mut sink)
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.total(), 2);
        let titles: Vec<&str> = report.migrated.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(store.count().unwrap(), 2);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Migrating ") && lines[0].ends_with("2017-01-01-first.md"));
        assert_eq!(
            lines[1],
            format!("Post#<id: {}, title: First>", report.migrated[0].id)
        );
        assert!(lines[2].ends_with("2017-01-02-second.md"));
        assert_eq!(
            lines[3],
            format!("Post#<id: {}, title: Second>", report.migrated[1].id)
        );
    }

    #[test]
    fn rerunning_a_batch_does_not_duplicate_posts() {
        let (_dir, paths) = write_posts(&[(
            "2017-01-01-first.md",
            post_file("First", "2017-01-01 00:00:00", "One."),
        )]);
        let store = store();
        let migrator = Migrator::new(&store, ErrorPolicy::FailFast);

        let first = migrator.run(&paths, &mut WriterSink::new(io::sink())).unwrap();
        let second = migrator.run(&paths, &mut WriterSink::new(io::sink())).unwrap();

        assert!(first.migrated[0].created);
        assert!(!second.migrated[0].created);
        assert_eq!(first.migrated[0].id, second.migrated[0].id);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn fail_fast_stops_at_first_bad_file() {
        let (_dir, paths) = write_posts(&[
            ("a.md", post_file("First", "2017-01-01 00:00:00", "One.")),
            ("b.md", "no header here\n".to_string()),
            ("c.md", post_file("Third", "2017-01-03 00:00:00", "Three.")),
        ]);
        let store = store();
        let mut sink = WriterSink::new(Vec::new());

        let err = Migrator::new(&store, ErrorPolicy::FailFast)
            .run(&paths, &mut sink)
            .unwrap_err();

        match err {
            BlogError::Aborted { path, source } => {
                assert!(path.ends_with("b.md"));
                assert!(matches!(
                    *source,
                    BlogError::MalformedDocument(DocumentError::MissingOpeningDelimiter)
                ));
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
        assert_eq!(store.count().unwrap(), 1);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(!out.contains("c.md"));
    }

    #[test]
    fn continue_policy_collects_failures_and_finishes() {
        let (dir, mut paths) = write_posts(&[
            ("a.md", post_file("First", "2017-01-01 00:00:00", "One.")),
            ("b.md", post_file("Bad Date", "whenever", "Two.")),
            ("c.md", post_file("Third", "2017-01-03 00:00:00", "Three.")),
        ]);
        paths.insert(1, dir.path().join("missing.md"));
        let store = store();

        let report = Migrator::new(&store, ErrorPolicy::Continue)
            .run(&paths, &mut WriterSink::new(io::sink()))
            .unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.total(), 4);
        assert_eq!(report.migrated.len(), 2);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[0].path.ends_with("missing.md"));
        assert!(matches!(report.failed[0].error, BlogError::Io(_)));
        assert!(matches!(
            report.failed[1].error,
            BlogError::MalformedDocument(DocumentError::InvalidDate(_))
        ));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn tracing_sink_runs_the_same_batch() {
        let (_dir, paths) = write_posts(&[
            ("a.md", post_file("First", "2017-01-01 00:00:00", "One.")),
            ("b.md", "no header here\n".to_string()),
        ]);
        let store = store();

        let report = Migrator::new(&store, ErrorPolicy::Continue)
            .run(&paths, &mut TracingSink)
            .unwrap();

        assert_eq!(report.migrated.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    struct BrokenSink;

    impl ProgressSink for BrokenSink {
        fn started(&mut self, _path: &Path) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn migrated(&mut self, _path: &Path, _post: &Post) -> io::Result<()> {
            Ok(())
        }

        fn failed(&mut self, _path: &Path, _error: &BlogError) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failures_abort_even_when_continuing() {
        let (_dir, paths) = write_posts(&[(
            "a.md",
            post_file("First", "2017-01-01 00:00:00", "One."),
        )]);
        let store = store();

        let err = Migrator::new(&store, ErrorPolicy::Continue)
            .run(&paths, &mut BrokenSink)
            .unwrap_err();
        assert!(matches!(err, BlogError::Io(_)));
        assert_eq!(store.count().unwrap(), 0);
    }
}
