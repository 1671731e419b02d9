//! Header line grammar.

use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "header.pest"]
struct HeaderGrammar;

/// One `key: value` header line, split at the first colon.
///
/// The value is trimmed and has every `"` removed. Because the split is at
/// the first colon, `title: Notes: Part 1` yields the value `Notes: Part 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub key: String,
    pub value: String,
}

/// Parse a single header line. Returns `None` if the line is not of the
/// form `key: value`.
#[must_use]
pub fn parse_header_line(line: &str) -> Option<HeaderField> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut pairs = HeaderGrammar::parse(Rule::header_line, line).ok()?;
    let mut inner = pairs.next()?.into_inner();

    let key = inner.next()?;
    let value = inner
        .next()
        .filter(|p| p.as_rule() == Rule::value)
        .map_or("", |p| p.as_str());

    Some(HeaderField {
        key: key.as_str().to_string(),
        value: clean_value(value),
    })
}

fn clean_value(raw: &str) -> String {
    raw.trim().replace('"', "")
}

/// Split a `tags` value into tag names.
///
/// Accepts `ruby, rails` as well as the inline-list form `[ruby, rails]`.
/// Entries are trimmed and empty entries dropped.
#[must_use]
pub fn split_tags(value: &str) -> Vec<String> {
    let value = value.trim();
    let value = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
