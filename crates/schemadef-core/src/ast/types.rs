//! SQL data type definitions.

use core::fmt;

/// A type clause exactly as written in a column definition.
///
/// `varchar(255)` has `words = ["varchar"]` and `args = ["255"]`;
/// `int(11) unsigned` additionally has `suffix = ["unsigned"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeName {
    /// Words before the argument list.
    pub words: Vec<String>,
    /// Raw argument texts inside the parentheses.
    pub args: Vec<String>,
    /// Words after the argument list.
    pub suffix: Vec<String>,
    /// Trailing `[]` array marker.
    pub array: bool,
}

/// Canonical, dialect-independent column type.
///
/// Produced by the normalizer so that `INT` and `integer` compare equal.
/// Anything without a dedicated variant is kept as lower-case text in
/// [`DataType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Column declared without a type (SQLite only).
    Unspecified,

    // Integer types
    /// Small integer (2 bytes).
    Smallint,
    /// Integer (4 bytes).
    Integer,
    /// Big integer (8 bytes).
    Bigint,

    // Floating point
    /// Real (4-byte float).
    Real,
    /// Double precision (8-byte float).
    Double,
    /// Exact numeric with optional precision and scale.
    Numeric {
        /// Total number of digits.
        precision: Option<u16>,
        /// Number of digits after decimal point.
        scale: Option<u16>,
    },

    // String types
    /// Fixed-length character string.
    Char(Option<u32>),
    /// Variable-length character string.
    Varchar(Option<u32>),
    /// Text (variable length, no limit).
    Text,

    /// Binary large object.
    Blob,

    // Date/time types
    /// Date.
    Date,
    /// Time.
    Time,
    /// Timestamp.
    Timestamp {
        /// `WITH TIME ZONE`.
        with_time_zone: bool,
    },
    /// DateTime (SQLite and MySQL).
    Datetime,

    /// Boolean.
    Boolean,

    /// Any other type, as canonical lower-case text.
    Custom(String),
}

impl DataType {
    /// Returns the SQL representation of the data type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Unspecified => String::new(),
            Self::Smallint => String::from("SMALLINT"),
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Real => String::from("REAL"),
            Self::Double => String::from("DOUBLE PRECISION"),
            Self::Numeric { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("NUMERIC({p}, {s})"),
                (Some(p), None) => format!("NUMERIC({p})"),
                _ => String::from("NUMERIC"),
            },
            Self::Char(len) => match len {
                Some(n) => format!("CHAR({n})"),
                None => String::from("CHAR"),
            },
            Self::Varchar(len) => match len {
                Some(n) => format!("VARCHAR({n})"),
                None => String::from("VARCHAR"),
            },
            Self::Text => String::from("TEXT"),
            Self::Blob => String::from("BLOB"),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::Timestamp { with_time_zone } => {
                if *with_time_zone {
                    String::from("TIMESTAMP WITH TIME ZONE")
                } else {
                    String::from("TIMESTAMP")
                }
            }
            Self::Datetime => String::from("DATETIME"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Returns true for the integer family.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Smallint | Self::Integer | Self::Bigint)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_to_sql() {
        assert_eq!(DataType::Integer.to_sql(), "INTEGER");
        assert_eq!(DataType::Varchar(Some(255)).to_sql(), "VARCHAR(255)");
        assert_eq!(
            DataType::Numeric {
                precision: Some(10),
                scale: Some(2)
            }
            .to_sql(),
            "NUMERIC(10, 2)"
        );
        assert_eq!(
            DataType::Timestamp {
                with_time_zone: true
            }
            .to_string(),
            "TIMESTAMP WITH TIME ZONE"
        );
        assert_eq!(DataType::Custom("int unsigned".into()).to_sql(), "int unsigned");
        assert_eq!(DataType::Unspecified.to_sql(), "");
    }

    #[test]
    fn test_is_integer() {
        assert!(DataType::Bigint.is_integer());
        assert!(!DataType::Text.is_integer());
    }
}
