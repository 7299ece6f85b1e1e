//! Dialect profiles.
//!
//! Each supported engine is described by a static [`Profile`]: how it quotes
//! and folds identifiers, which type spellings are synonyms, and which schema
//! changes it can express directly. A [`Dialect`] value is chosen once and
//! passed explicitly through parsing, normalization, diffing and generation.

mod mysql;
mod postgres;
mod sqlite;

use core::fmt;
use core::str::FromStr;

use crate::ast::DataType;

/// How unquoted and quoted identifiers are folded before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFolding {
    /// Names are case-insensitive: fold everything to lower case.
    LowerAll,
    /// Unquoted names fold to lower case, quoted names keep their case.
    LowerUnquoted,
    /// Names keep their case.
    Preserve,
}

/// How a changed column definition is realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyStrategy {
    /// `DROP COLUMN` followed by `ADD COLUMN`.
    DropAndAdd,
    /// `ALTER COLUMN` subclauses (TYPE, SET/DROP NOT NULL, SET/DROP DEFAULT).
    AlterColumn,
    /// `MODIFY COLUMN` with the full new definition.
    Modify,
}

/// Whether column order is part of a table's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrderPolicy {
    /// Reordering alone is a no-op; added columns are appended.
    Ignore,
    /// Columns are placed with `FIRST` / `AFTER` to match the desired order.
    Reposition,
}

/// What the parser does with statements it has no grammar for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownStatementPolicy {
    /// Keep the statement text verbatim in the snapshot.
    PassThrough,
    /// Fail with a parse error.
    Reject,
}

/// Static description of a database engine.
#[derive(Debug)]
pub struct Profile {
    /// Dialect name.
    pub name: &'static str,
    /// Quote character used for every identifier in generated DDL.
    pub quote: char,
    /// Identifier case folding.
    pub case_folding: CaseFolding,
    /// Whether `#` starts a line comment.
    pub hash_comments: bool,
    /// Schema qualifier that is equivalent to no qualifier.
    pub default_schema: Option<&'static str>,
    /// Column modification strategy.
    pub modify_strategy: ModifyStrategy,
    /// Column order policy.
    pub column_order: ColumnOrderPolicy,
    /// Whether `ALTER TABLE .. ADD/DROP CONSTRAINT` is available.
    pub alter_constraints: bool,
    /// Whether foreign keys are checked lazily, so creation order of
    /// mutually referencing tables does not matter.
    pub deferred_foreign_keys: bool,
    /// Whether `CREATE INDEX .. WHERE` is supported.
    pub partial_indexes: bool,
    /// Whether `KEY`/`INDEX` entries may appear inside CREATE TABLE.
    pub inline_indexes: bool,
    /// Whether index names are scoped to their table instead of the schema.
    pub table_scoped_index_names: bool,
    /// Whether integer display widths such as `int(11)` are ignored.
    pub ignore_integer_width: bool,
    /// Name every primary key constraint receives, if the engine fixes it.
    pub primary_key_name: Option<&'static str>,
    /// Unknown statement policy.
    pub unknown_statements: UnknownStatementPolicy,
    /// Type synonyms checked before the common ones.
    pub type_synonyms: &'static [(&'static str, &'static str)],
    /// Pseudo-types that mean "integer type plus autoincrement".
    pub serial_types: &'static [(&'static str, &'static str)],
}

/// Synonyms shared by every dialect.
const COMMON_TYPE_SYNONYMS: &[(&str, &str)] = &[
    ("int", "integer"),
    ("bool", "boolean"),
    ("dec", "numeric"),
    ("decimal", "numeric"),
    ("double", "double precision"),
    ("character varying", "varchar"),
    ("character", "char"),
    ("timestamp without time zone", "timestamp"),
];

/// A supported database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite 3.
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL.
    Mysql,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Self; 3] = [Self::Sqlite, Self::Postgres, Self::Mysql];

    /// Returns the static profile of this dialect.
    #[must_use]
    pub fn profile(self) -> &'static Profile {
        match self {
            Self::Sqlite => &sqlite::PROFILE,
            Self::Postgres => &postgres::PROFILE,
            Self::Mysql => &mysql::PROFILE,
        }
    }

    /// Returns the dialect name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.profile().name
    }

    /// Quotes a single identifier, doubling embedded quote characters.
    #[must_use]
    pub fn quote_identifier(self, name: &str) -> String {
        let q = self.profile().quote;
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Quotes a canonical object name, which may carry a `schema.` prefix.
    #[must_use]
    pub fn quote_name(self, name: &str) -> String {
        match name.split_once('.') {
            Some((schema, object)) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(object)
            ),
            None => self.quote_identifier(name),
        }
    }

    /// Resolves a lower-case base type spelling through the synonym tables.
    ///
    /// Returns the canonical spelling and whether the spelling was a serial
    /// pseudo-type implying autoincrement.
    #[must_use]
    pub fn resolve_type_name(self, base: &str) -> (String, bool) {
        let profile = self.profile();
        if let Some((_, target)) = profile.serial_types.iter().find(|(from, _)| *from == base) {
            return ((*target).to_string(), true);
        }
        let lookup = |table: &[(&str, &str)]| {
            table
                .iter()
                .find(|(from, _)| *from == base)
                .map(|(_, to)| (*to).to_string())
        };
        let resolved = lookup(profile.type_synonyms)
            .or_else(|| lookup(COMMON_TYPE_SYNONYMS))
            .unwrap_or_else(|| base.to_string());
        (resolved, false)
    }

    /// Renders a canonical type for a column definition.
    #[must_use]
    pub fn type_sql(self, data_type: &DataType, autoincrement: bool) -> String {
        match self {
            Self::Sqlite => sqlite::type_sql(data_type),
            Self::Postgres => postgres::type_sql(data_type, autoincrement),
            Self::Mysql => mysql::type_sql(data_type),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "psql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::Sqlite.quote_identifier("users"), "`users`");
        assert_eq!(Dialect::Mysql.quote_identifier("a`b"), "`a``b`");
        assert_eq!(Dialect::Postgres.quote_identifier("users"), "\"users\"");
    }

    #[test]
    fn test_quote_qualified_name() {
        assert_eq!(
            Dialect::Postgres.quote_name("audit.events"),
            "\"audit\".\"events\""
        );
    }

    #[test]
    fn test_resolve_common_synonyms() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.resolve_type_name("character varying").0, "varchar");
            assert_eq!(dialect.resolve_type_name("decimal").0, "numeric");
            assert_eq!(dialect.resolve_type_name("text").0, "text");
        }
    }

    #[test]
    fn test_dialect_synonyms_take_precedence() {
        assert_eq!(Dialect::Postgres.resolve_type_name("bool").0, "boolean");
        assert_eq!(Dialect::Mysql.resolve_type_name("bool").0, "tinyint");
        assert_eq!(Dialect::Postgres.resolve_type_name("int8").0, "bigint");
    }

    #[test]
    fn test_serial_types() {
        assert_eq!(
            Dialect::Postgres.resolve_type_name("bigserial"),
            ("bigint".to_string(), true)
        );
        assert_eq!(
            Dialect::Sqlite.resolve_type_name("serial"),
            ("serial".to_string(), false)
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("SQLite3".parse::<Dialect>(), Ok(Dialect::Sqlite));
        assert_eq!("postgresql".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
