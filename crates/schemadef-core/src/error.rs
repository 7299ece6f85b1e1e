//! Error types for the schema pipeline.

use core::fmt;

use crate::parser::ParseError;

/// Kind of schema entity named in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Table.
    Table,
    /// View.
    View,
    /// Index.
    Index,
    /// Column.
    Column,
    /// Constraint.
    Constraint,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::View => "view",
            Self::Index => "index",
            Self::Column => "column",
            Self::Constraint => "constraint",
        })
    }
}

/// Errors raised while parsing, modeling, diffing or rendering a schema.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed DDL text.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A CREATE named an entity that already exists.
    #[error("Duplicate {kind}: {name}")]
    DuplicateEntity {
        /// Entity kind.
        kind: EntityKind,
        /// Entity name.
        name: String,
    },

    /// A DROP or ALTER named an entity that does not exist.
    #[error("Unknown {kind}: {name}")]
    UnknownEntity {
        /// Entity kind.
        kind: EntityKind,
        /// Entity name.
        name: String,
    },

    /// A snapshot violates a structural invariant.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The dialect cannot express a required change.
    #[error("Unsupported construct for {dialect}: {construct}")]
    UnsupportedConstruct {
        /// Dialect name.
        dialect: &'static str,
        /// What could not be rendered.
        construct: String,
    },
}

impl Error {
    pub(crate) fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::DuplicateEntity {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn unknown(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::UnknownEntity {
            kind,
            name: name.into(),
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, Error>;
