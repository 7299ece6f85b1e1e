//! # schemadef-core
//!
//! Declarative schema management: compare the schema a database has with the
//! schema a DDL file declares, and generate the statements that get from one
//! to the other.
//!
//! The pipeline is a chain of pure functions:
//!
//! - [`parser`] turns DDL text into [`ast::Statement`]s
//! - [`normalize`] folds identifiers, types and expressions to canonical form
//! - [`schema`] folds statements into a [`Snapshot`]
//! - [`diff`] compares two snapshots and orders the [`Operation`]s
//! - [`generate`] renders the operations for a [`Dialect`]
//!
//! ## Example
//!
//! ```rust
//! use schemadef_core::{generate_idempotent_ddls, Dialect, GenerateOptions};
//!
//! let current = "CREATE TABLE users (id integer PRIMARY KEY);";
//! let desired = "CREATE TABLE users (id integer PRIMARY KEY, name text);";
//!
//! let plan = generate_idempotent_ddls(
//!     Dialect::Sqlite,
//!     desired,
//!     current,
//!     &GenerateOptions::default(),
//! )?;
//! let sql: Vec<String> = plan.statements().iter().map(ToString::to_string).collect();
//! assert_eq!(sql, ["ALTER TABLE `users` ADD COLUMN `name` TEXT;"]);
//! # Ok::<(), schemadef_core::Error>(())
//! ```

pub mod ast;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod generate;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod schema;

pub use ast::Statement;
pub use dialect::Dialect;
pub use diff::{Differ, Operation, Placement};
pub use error::{EntityKind, Error, Result};
pub use generate::{Ddl, GenerateOptions, Generator, Plan};
pub use parser::{ParseError, Parser};
pub use schema::{SchemaBuilder, Snapshot};

/// Parses DDL text into statements.
///
/// # Errors
///
/// Returns [`Error::Parse`] on malformed input.
pub fn parse(dialect: Dialect, sql: &str) -> Result<Vec<Statement>> {
    Ok(Parser::new(sql, dialect).parse_statements()?)
}

/// Parses DDL text and folds it into a snapshot.
///
/// # Errors
///
/// Fails on malformed input and on statements that contradict each other.
pub fn parse_schema(dialect: Dialect, sql: &str) -> Result<Snapshot> {
    let statements = parse(dialect, sql)?;
    schema::build(dialect, &statements)
}

/// Computes the statements that turn the `current` schema into the
/// `desired` one.
///
/// # Errors
///
/// Fails if either text does not parse or build, or if a required change
/// cannot be expressed in the dialect. Nothing is generated on failure.
pub fn generate_idempotent_ddls(
    dialect: Dialect,
    desired: &str,
    current: &str,
    options: &GenerateOptions,
) -> Result<Plan> {
    let desired = parse_schema(dialect, desired)?;
    let current = parse_schema(dialect, current)?;
    generate::plan(dialect, &current, &desired, options)
}
