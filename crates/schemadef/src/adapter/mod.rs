//! Database adapters.
//!
//! An adapter reads the live schema back as DDL text and executes generated
//! statements. The schema pipeline never talks to a database itself.

mod sqlite;

use async_trait::async_trait;
use schemadef_core::Dialect;

use crate::error::Result;

pub use sqlite::SqliteAdapter;

/// Access to a live database.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// The dialect the database speaks.
    fn dialect(&self) -> Dialect;

    /// Dumps the current schema as DDL text, each statement terminated.
    async fn dump(&self) -> Result<String>;

    /// Executes statements in order, stopping at the first failure.
    async fn apply(&self, statements: &[String]) -> Result<()>;
}
