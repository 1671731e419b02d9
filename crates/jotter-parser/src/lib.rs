//! # jotter-parser
//!
//! Post file parser. Header lines are matched by a small pest PEG grammar
//! (`src/header.pest`); the document splitter around it finds the `---`
//! delimited header block and extracts the body.

pub mod document;
pub mod header;

pub use document::{parse_post, render_post};
pub use header::{parse_header_line, split_tags, HeaderField};
