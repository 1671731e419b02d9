//! Result formatting: Table, JSON, and Markdown output.
//!
//! Every view is printed together with the HTTP cache headers a web
//! front end would send for it.

use jotter_core::post::Post;
use jotter_store::TagCount;
use serde_json::{json, Map, Value};

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

pub type Headers = Vec<(&'static str, String)>;

/// Format a post listing.
#[must_use]
pub fn format_posts(posts: &[Post], headers: &Headers, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(json!({
            "headers": headers_json(headers),
            "posts": posts,
        })),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = posts.iter().map(post_row).collect();
            let mut output = header_lines(headers);
            output.push_str(&format_table(&POST_COLUMNS, &rows));
            output
        }
        OutputFormat::Markdown => {
            let rows: Vec<Vec<String>> = posts.iter().map(post_row).collect();
            let mut output = header_lines(headers);
            output.push_str(&format_markdown(&POST_COLUMNS, &rows));
            output
        }
    }
}

/// Format a single post with its body.
#[must_use]
pub fn format_post(post: &Post, headers: &Headers, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(json!({
            "headers": headers_json(headers),
            "post": post,
        })),
        OutputFormat::Table => {
            let mut output = header_lines(headers);
            output.push_str(&format!(
                "title:       {}\nslug:        {}\ndate:        {}\ndescription: {}\ntags:        {}\n\n{}",
                post.title,
                post.slug,
                post.created_at.format("%Y-%m-%d %H:%M:%S"),
                post.description,
                post.tags.join(", "),
                post.body
            ));
            output
        }
        OutputFormat::Markdown => {
            let mut output = header_lines(headers);
            output.push_str(&format!(
                "# {}\n\n*{}*\n\n{}",
                post.title,
                post.created_at.format("%B %-d, %Y"),
                post.body
            ));
            output
        }
    }
}

/// Format the tag index.
#[must_use]
pub fn format_tag_counts(counts: &[TagCount], format: OutputFormat) -> String {
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|c| vec![c.tag.clone(), c.posts.to_string()])
        .collect();

    match format {
        OutputFormat::Json => to_json(Value::Array(
            counts
                .iter()
                .map(|c| json!({ "tag": c.tag, "posts": c.posts }))
                .collect(),
        )),
        OutputFormat::Table => format_table(&["tag", "posts"], &rows),
        OutputFormat::Markdown => format_markdown(&["tag", "posts"], &rows),
    }
}

const POST_COLUMNS: [&str; 5] = ["id", "date", "slug", "title", "tags"];

fn post_row(post: &Post) -> Vec<String> {
    vec![
        post.id.to_string(),
        post.created_at.format("%Y-%m-%d").to_string(),
        post.slug.clone(),
        post.title.clone(),
        post.tags.join(", "),
    ]
}

fn headers_json(headers: &Headers) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| ((*name).to_string(), Value::String(value.clone())))
        .collect();
    Value::Object(map)
}

fn header_lines(headers: &Headers) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let mut output = String::new();
    for (name, value) in headers {
        output.push_str(&format!("{name}: {value}\n"));
    }
    output.push('\n');
    output
}

fn to_json(value: Value) -> String {
    let mut output = serde_json::to_string_pretty(&value).unwrap_or_else(|_| "null".to_string());
    output.push('\n');
    output
}

fn format_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "(no results)\n".to_string();
    }

    // Column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();

    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&sep.join("-+-"));
    output.push('\n');

    for row in rows {
        let vals: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect();
        output.push_str(vals.join(" | ").trim_end());
        output.push('\n');
    }

    output
}

fn format_markdown(columns: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "*No results*\n".to_string();
    }

    let mut output = String::new();

    output.push_str("| ");
    output.push_str(&columns.join(" | "));
    output.push_str(" |\n");

    output.push_str("| ");
    let seps: Vec<&str> = columns.iter().map(|_| "---").collect();
    output.push_str(&seps.join(" | "));
    output.push_str(" |\n");

    for row in rows {
        output.push_str("| ");
        let vals: Vec<String> = row.iter().map(|cell| cell.replace('|', "\\|")).collect();
        output.push_str(&vals.join(" | "));
        output.push_str(" |\n");
    }

    output
}
