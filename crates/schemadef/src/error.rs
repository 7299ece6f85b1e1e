//! Error types for schema management runs.

use std::path::PathBuf;

/// Errors that can occur while dumping, planning or applying a schema.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The schema pipeline rejected the input.
    #[error(transparent)]
    Schema(#[from] schemadef_core::Error),

    /// Database error outside of statement execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A generated statement failed; nothing after it was executed.
    #[error("Failed to apply '{statement}': {source}")]
    Apply {
        /// The failing statement.
        statement: String,
        /// The database error.
        source: sqlx::Error,
    },

    /// IO error (reading schema or config files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a config file.
    #[error("Invalid config file '{path}': {source}")]
    Config {
        /// Path to the config file.
        path: PathBuf,
        /// Deserialization error.
        source: serde_json::Error,
    },

    /// A table filter pattern is not a valid regular expression.
    #[error("Invalid table pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for schema management runs.
pub type Result<T> = std::result::Result<T, Error>;
