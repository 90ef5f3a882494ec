//! Error types for restyle.

use std::io;

/// Errors produced at the boundaries of the style resolution pipeline.
///
/// The cascade itself never fails; these cover configuration loading,
/// document validation, selector construction and stylesheet acquisition.
#[derive(Debug, thiserror::Error)]
pub enum RestyleError {
    #[error("config error: {0}")]
    Config(String),

    #[error("malformed document: {0}")]
    Document(String),

    #[error("unsupported selector: {0}")]
    Selector(String),

    #[error("CSS parse error: {0}")]
    Parse(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RestyleError>;
