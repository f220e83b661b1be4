use std::io;

use thiserror::Error;

/// Main error type for kithkit operations.
#[derive(Error, Debug)]
pub enum KkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Skill revoked: {reason} (severity: {severity})")]
    Revoked { reason: String, severity: String },

    #[error("Already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractErrorKind),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Not installed: {0}")]
    NotInstalled(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure modes of safe archive extraction.
#[derive(Error, Debug)]
pub enum ExtractErrorKind {
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    #[error("Bad archive header: {0}")]
    BadHeader(String),

    #[error("Truncated archive: {0}")]
    Truncated(String),

    #[error("IO error during extraction: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, KkError>;
