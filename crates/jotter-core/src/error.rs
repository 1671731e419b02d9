//! Error types for jotter.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level result type for jotter operations.
pub type Result<T> = std::result::Result<T, BlogError>;

/// Top-level error type for jotter.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] DocumentError),

    #[error("missing required input: {0}")]
    MissingRequiredInput(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("vault error: {0}")]
    Vault(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("migration aborted at {}: {source}", path.display())]
    Aborted {
        path: PathBuf,
        #[source]
        source: Box<BlogError>,
    },
}

/// Ways a post file can fail to match the flat-file shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document must start with a '---' header delimiter")]
    MissingOpeningDelimiter,

    #[error("no closing '---' header delimiter found")]
    MissingClosingDelimiter,

    #[error("line {line}: expected `key: value`, got {content:?}")]
    InvalidHeaderLine { line: usize, content: String },

    #[error("header field '{0}' appears more than once")]
    DuplicateField(String),

    #[error("header field '{0}' is required")]
    MissingField(&'static str),

    #[error("unrecognized date {0:?}")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_human_readable_messages() {
        let err = BlogError::from(DocumentError::MissingField("title"));
        let msg = err.to_string();
        assert!(msg.starts_with("malformed document"));
        assert!(msg.contains("title"));

        let err = DocumentError::InvalidHeaderLine {
            line: 4,
            content: "nonsense".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 4"));
        assert!(msg.contains("nonsense"));
    }

    #[test]
    fn aborted_error_names_path_and_cause() {
        let err = BlogError::Aborted {
            path: PathBuf::from("posts/2017-01-01-example.md"),
            source: Box::new(DocumentError::MissingClosingDelimiter.into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("posts/2017-01-01-example.md"));
        assert!(msg.contains("closing"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
