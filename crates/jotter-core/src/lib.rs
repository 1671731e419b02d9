//! # jotter-core
//!
//! Core types for the jotter blog engine.
//!
//! This crate defines the foundational types used across all other jotter crates:
//! - [`Post`]: a stored blog post, and [`ParsedPost`], the fields read from a post file
//! - [`PostRepository`]: the title-keyed upsert interface storage implements
//! - [`Clock`]: injected time source ([`SystemClock`], [`FixedClock`])
//! - Cache keys and CDN headers ([`SurrogateKey`], [`CachePolicy`])
//! - Configuration ([`BlogConfig`], [`ErrorPolicy`])
//! - Error hierarchy ([`BlogError`], [`DocumentError`])

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod post;
pub mod repository;

pub use cache::{CachePolicy, SurrogateKey};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BlogConfig, ErrorPolicy};
pub use error::{BlogError, DocumentError, Result};
pub use post::{ParsedPost, Post, PostChanges};
pub use repository::{PostRepository, Upserted};
