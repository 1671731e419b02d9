//! # jotter-migrate
//!
//! Moves post files into the post store.
//!
//! Includes:
//! - [`PostSynchronizer`]: parsed post to title-keyed upsert
//! - [`Migrator`]: ordered batch driver with a fail-fast or continue policy
//! - [`ProgressSink`]: per-file progress reporting (stdout lines or tracing)

pub mod batch;
pub mod sink;
pub mod sync;

pub use batch::{FailedPost, MigratedPost, MigrationReport, Migrator};
pub use sink::{ProgressSink, TracingSink, WriterSink};
pub use sync::PostSynchronizer;
