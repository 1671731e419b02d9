//! Post file parsing and rendering.
//!
//! A post file looks like:
//! ```markdown
//! ---
//! layout: post
//! title: Example Post
//! date: 2017-01-01 00:00:00
//! description: An example
//! tags: ruby, rails
//! ---
//!
//! Hello world.
//! ```
//!
//! Header fields may appear in any order and `layout`, `description` and
//! `tags` may be left out. One blank line after the closing `---` is
//! optional and never part of the body.

use std::collections::BTreeMap;

use jotter_core::error::DocumentError;
use jotter_core::post::ParsedPost;

use crate::header::{parse_header_line, split_tags};

const DELIMITER: &str = "---";

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Parse the text of a post file into its structured fields.
///
/// The date is not validated here; see [`ParsedPost::published_at`].
///
/// # Errors
///
/// Returns a [`DocumentError`] if the header block is missing, unterminated,
/// contains a line that is not `key: value`, repeats a field, or lacks
/// `title` or `date`.
pub fn parse_post(content: &str) -> Result<ParsedPost, DocumentError> {
    if content.trim().is_empty() {
        return Err(DocumentError::EmptyDocument);
    }

    let lines: Vec<&str> = content.split('\n').collect();
    if !is_delimiter(lines[0]) {
        return Err(DocumentError::MissingOpeningDelimiter);
    }

    let close = lines
        .iter()
        .skip(1)
        .position(|line| is_delimiter(line))
        .map(|offset| offset + 1)
        .ok_or(DocumentError::MissingClosingDelimiter)?;

    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for (index, line) in lines.iter().enumerate().take(close).skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let field = parse_header_line(line).ok_or_else(|| DocumentError::InvalidHeaderLine {
            line: index + 1,
            content: (*line).to_string(),
        })?;
        tracing::debug!(key = %field.key, value = %field.value, "header field");
        if fields.contains_key(&field.key) {
            return Err(DocumentError::DuplicateField(field.key));
        }
        fields.insert(field.key, field.value);
    }

    let title = fields
        .remove("title")
        .ok_or(DocumentError::MissingField("title"))?;
    let date = fields
        .remove("date")
        .ok_or(DocumentError::MissingField("date"))?;
    let layout = fields.remove("layout");
    let description = fields.remove("description").unwrap_or_default();
    let tags = fields
        .remove("tags")
        .map(|value| split_tags(&value))
        .unwrap_or_default();

    Ok(ParsedPost {
        layout,
        title,
        date,
        description,
        tags,
        body: extract_body(&lines[close + 1..]),
        extra: fields,
    })
}

/// Rebuild the body from the lines after the closing delimiter.
///
/// A leading blank separator line is skipped, trailing blank lines are
/// dropped, and exactly one trailing newline is appended.
fn extract_body(rest: &[&str]) -> String {
    let rest = match rest.first() {
        Some(first) if first.trim_end_matches('\r').is_empty() => &rest[1..],
        _ => rest,
    };
    let end = rest
        .iter()
        .rposition(|line| !line.trim_end_matches('\r').is_empty())
        .map_or(0, |last| last + 1);

    let mut body = rest[..end].join("\n");
    body.push('\n');
    body
}

/// Render a parsed post back into the flat-file format.
///
/// Values are written verbatim, so a value containing `"` will not survive
/// a round trip (the parser strips quotes).
#[must_use]
pub fn render_post(post: &ParsedPost) -> String {
    let mut output = String::with_capacity(post.body.len() + 128);
    output.push_str(DELIMITER);
    output.push('\n');

    let layout = post.layout.as_deref().unwrap_or("post");
    push_field(&mut output, "layout", layout);
    push_field(&mut output, "title", &post.title);
    push_field(&mut output, "date", &post.date);
    push_field(&mut output, "description", &post.description);
    push_field(&mut output, "tags", &post.tags.join(", "));
    for (key, value) in &post.extra {
        push_field(&mut output, key, value);
    }

    output.push_str(DELIMITER);
    output.push('\n');

    let body = post.body.trim_end_matches('\n');
    if !body.is_empty() {
        output.push('\n');
        output.push_str(body);
        output.push('\n');
    }

    output
}

fn push_field(output: &mut String, key: &str, value: &str) {
    output.push_str(key);
    output.push(':');
    if !value.is_empty() {
        output.push(' ');
        output.push_str(value);
    }
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "---
layout: post
title: Example Post
date: 2017-01-01 00:00:00
description: An example
tags: ruby, rails
---

Hello world.
";

    #[test]
    fn parses_example_post() {
        let post = parse_post(EXAMPLE).unwrap();
        assert_eq!(post.layout.as_deref(), Some("post"));
        assert_eq!(post.title, "Example Post");
        assert_eq!(post.date, "2017-01-01 00:00:00");
        assert_eq!(post.description, "An example");
        assert_eq!(post.tags, vec!["ruby", "rails"]);
        assert_eq!(post.body, "Hello world.\n");
        assert!(post.extra.is_empty());
    }

    #[test]
    fn untagged_post_has_no_tags_and_same_body() {
        let content = "---
layout: post
title: Example Post
date: 2017-01-01 00:00:00
description: An example
---

Hello world.
";
        let post = parse_post(content).unwrap();
        assert!(post.tags.is_empty());
        assert_eq!(post.body, "Hello world.\n");
    }

    #[test]
    fn tags_line_shifts_body_by_exactly_one_line() {
        let tagged = parse_post(EXAMPLE).unwrap();
        let untagged = parse_post(&EXAMPLE.replace("tags: ruby, rails\n", "")).unwrap();
        assert_eq!(tagged.body, untagged.body);

        let tagged_lines: Vec<&str> = EXAMPLE.split('\n').collect();
        let tagged_start = tagged_lines
            .iter()
            .position(|l| *l == "Hello world.")
            .unwrap();
        let untagged_text = EXAMPLE.replace("tags: ruby, rails\n", "");
        let untagged_start = untagged_text
            .split('\n')
            .position(|l| l == "Hello world.")
            .unwrap();
        assert_eq!(tagged_start, untagged_start + 1);
    }

    #[test]
    fn body_starts_immediately_without_blank_separator() {
        let content = "---\ntitle: T\ndate: 2017-01-01 00:00:00\n---\nFirst line.\n";
        assert_eq!(parse_post(content).unwrap().body, "First line.\n");
    }

    #[test]
    fn only_one_blank_separator_is_skipped() {
        let content = "---\ntitle: T\ndate: 2017-01-01 00:00:00\n---\n\n\nIndented start.\n";
        assert_eq!(parse_post(content).unwrap().body, "\nIndented start.\n");
    }

    #[test]
    fn body_keeps_inner_newlines_and_ends_with_one_newline() {
        let content =
            "---\ntitle: T\ndate: 2017-01-01 00:00:00\n---\n\nOne.\n\nTwo:  three\n\n\n";
        assert_eq!(parse_post(content).unwrap().body, "One.\n\nTwo:  three\n");
    }

    #[test]
    fn body_without_trailing_newline_gets_one() {
        let content = "---\ntitle: T\ndate: 2017-01-01 00:00:00\n---\n\nNo newline";
        assert_eq!(parse_post(content).unwrap().body, "No newline\n");
    }

    #[test]
    fn header_only_document_has_newline_body() {
        let content = "---\ntitle: T\ndate: 2017-01-01 00:00:00\n---\n";
        assert_eq!(parse_post(content).unwrap().body, "\n");
    }

    #[test]
    fn body_may_contain_delimiters() {
        let content = "---\ntitle: T\ndate: 2017-01-01 00:00:00\n---\n\nAbove\n---\nBelow\n";
        assert_eq!(parse_post(content).unwrap().body, "Above\n---\nBelow\n");
    }

    #[test]
    fn header_field_order_does_not_matter() {
        let content =
            "---\ntags: go\ndate: 2017-01-01 00:00:00\ntitle: Shuffled\nlayout: post\n---\n\nBody\n";
        let post = parse_post(content).unwrap();
        assert_eq!(post.title, "Shuffled");
        assert_eq!(post.tags, vec!["go"]);
        assert_eq!(post.description, "");
    }

    #[test]
    fn title_with_colon_is_kept_whole() {
        let content = "---\ntitle: Notes: Part 1\ndate: 2017-01-01 00:00:00\n---\n\nBody\n";
        assert_eq!(parse_post(content).unwrap().title, "Notes: Part 1");
    }

    #[test]
    fn empty_template_fields_parse_as_empty() {
        let content =
            "---\nlayout: post\ntitle: Draft\ndate: 2017-01-01 00:00:00\ndescription:\ntags:\n---\n";
        let post = parse_post(content).unwrap();
        assert_eq!(post.description, "");
        assert!(post.tags.is_empty());
    }

    #[test]
    fn unknown_keys_are_kept_as_extra() {
        let content = "---\ntitle: T\ndate: 2017-01-01 00:00:00\ncomments: false\n---\n\nBody\n";
        let post = parse_post(content).unwrap();
        assert_eq!(post.extra.get("comments").map(String::as_str), Some("false"));
    }

    #[test]
    fn crlf_documents_parse() {
        let content = "---\r\ntitle: T\r\ndate: 2017-01-01 00:00:00\r\n---\r\n\r\nBody\r\n";
        let post = parse_post(content).unwrap();
        assert_eq!(post.title, "T");
        assert_eq!(post.date, "2017-01-01 00:00:00");
        assert_eq!(post.body, "Body\r\n");
    }

    #[test]
    fn crlf_trailing_blank_lines_are_dropped() {
        let content = "---\r\ntitle: T\r\ndate: 2017-01-01\r\n---\r\n\r\nBody\r\n\r\n\r\n";
        let post = parse_post(content).unwrap();
        assert_eq!(post.body, "Body\r\n");
        assert!(!post.body.ends_with("\n\r\n"));
    }

    #[test]
    fn rejects_empty_document() {
        assert_eq!(parse_post(""), Err(DocumentError::EmptyDocument));
        assert_eq!(parse_post("\n\n"), Err(DocumentError::EmptyDocument));
    }

    #[test]
    fn rejects_missing_opening_delimiter() {
        assert_eq!(
            parse_post("title: T\ndate: 2017-01-01\n---\n"),
            Err(DocumentError::MissingOpeningDelimiter)
        );
    }

    #[test]
    fn rejects_short_document_without_closing_delimiter() {
        assert_eq!(
            parse_post("---\ntitle: T\n"),
            Err(DocumentError::MissingClosingDelimiter)
        );
        assert_eq!(parse_post("---"), Err(DocumentError::MissingClosingDelimiter));
    }

    #[test]
    fn rejects_invalid_header_line_with_line_number() {
        let err = parse_post("---\ntitle: T\nnot a field\n---\n").unwrap_err();
        assert_eq!(
            err,
            DocumentError::InvalidHeaderLine {
                line: 3,
                content: "not a field".to_string()
            }
        );
    }

    #[test]
    fn rejects_duplicate_fields() {
        let err = parse_post("---\ntitle: A\ntitle: B\ndate: 2017-01-01\n---\n").unwrap_err();
        assert_eq!(err, DocumentError::DuplicateField("title".to_string()));
    }

    #[test]
    fn rejects_missing_title_or_date() {
        assert_eq!(
            parse_post("---\ndate: 2017-01-01\n---\n"),
            Err(DocumentError::MissingField("title"))
        );
        assert_eq!(
            parse_post("---\ntitle: T\n---\n"),
            Err(DocumentError::MissingField("date"))
        );
    }

    #[test]
    fn empty_title_is_left_to_the_store() {
        let post = parse_post("---\ntitle:\ndate: 2017-01-01\n---\n").unwrap();
        assert_eq!(post.title, "");
    }

    #[test]
    fn render_reproduces_example() {
        let post = parse_post(EXAMPLE).unwrap();
        assert_eq!(render_post(&post), EXAMPLE);
    }

    #[test]
    fn render_writes_empty_template_fields_bare() {
        let post = ParsedPost {
            title: "Draft".to_string(),
            date: "2017-01-01 00:00:00".to_string(),
            body: "\n".to_string(),
            ..ParsedPost::default()
        };
        assert_eq!(
            render_post(&post),
            "---\nlayout: post\ntitle: Draft\ndate: 2017-01-01 00:00:00\ndescription:\ntags:\n---\n"
        );
    }
}
