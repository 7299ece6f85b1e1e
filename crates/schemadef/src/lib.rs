//! Idempotent schema management.
//!
//! `schemadef` keeps a database in line with a plain DDL file: it dumps the
//! live schema, compares it with the file using [`schemadef_core`], and
//! applies only the statements needed to close the gap. Running it twice in
//! a row does nothing the second time.
//!
//! - **Adapter** - reads the live schema and executes statements
//! - **Config** - selects which tables a run manages
//! - **Runner** - ties both to the schema pipeline and renders the report

pub mod adapter;
pub mod config;
pub mod error;
pub mod runner;

pub use adapter::{DatabaseAdapter, SqliteAdapter};
pub use config::{Config, TableFilter};
pub use error::{Error, Result};
pub use runner::Runner;
