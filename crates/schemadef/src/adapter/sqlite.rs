//! SQLite adapter.

use std::path::Path;

use async_trait::async_trait;
use schemadef_core::Dialect;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, warn};

use super::DatabaseAdapter;
use crate::error::{Error, Result};

/// Schema objects in dump order: tables, then indexes, views and triggers,
/// each in creation order. Internal `sqlite_%` objects and automatic indexes
/// (which have no SQL) are left out.
const DUMP_SQL: &str = r"
SELECT sql FROM sqlite_master
WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
ORDER BY CASE type
    WHEN 'table' THEN 0
    WHEN 'index' THEN 1
    WHEN 'view' THEN 2
    WHEN 'trigger' THEN 3
    ELSE 4
END, rowid
";

/// A SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteAdapter {
    pool: SqlitePool,
}

impl SqliteAdapter {
    /// Opens the database file, creating it if it does not exist.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        debug!(path = %path.as_ref().display(), "Connected to SQLite database");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn dump(&self) -> Result<String> {
        let rows: Vec<(String,)> = sqlx::query_as(DUMP_SQL).fetch_all(&self.pool).await?;
        debug!(statements = rows.len(), "Dumped schema");
        Ok(rows
            .into_iter()
            .map(|(sql,)| format!("{sql};\n"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn apply(&self, statements: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in statements {
            debug!(sql = %statement, "Executing SQL");
            if let Err(source) = sqlx::query(statement).execute(&mut *tx).await {
                warn!(sql = %statement, error = %source, "Statement failed, rolling back");
                tx.rollback().await?;
                return Err(Error::Apply {
                    statement: statement.clone(),
                    source,
                });
            }
        }
        tx.commit().await?;
        info!(statements = statements.len(), "Applied schema changes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_adapter() -> SqliteAdapter {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        SqliteAdapter::from_pool(pool)
    }

    #[tokio::test]
    async fn test_dump_empty() {
        let adapter = create_test_adapter().await;
        assert_eq!(adapter.dump().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_dump_orders_tables_before_indexes_and_views() {
        let adapter = create_test_adapter().await;
        adapter
            .apply(&[
                "CREATE TABLE users (id integer PRIMARY KEY, name text UNIQUE)".to_string(),
                "CREATE VIEW names AS SELECT name FROM users".to_string(),
                "CREATE INDEX users_name ON users (name)".to_string(),
                "CREATE TABLE posts (id integer)".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(
            adapter.dump().await.unwrap(),
            "CREATE TABLE users (id integer PRIMARY KEY, name text UNIQUE);\n\
             \n\
             CREATE TABLE posts (id integer);\n\
             \n\
             CREATE INDEX users_name ON users (name);\n\
             \n\
             CREATE VIEW names AS SELECT name FROM users;\n"
        );
    }

    #[tokio::test]
    async fn test_apply_stops_at_first_failure() {
        let adapter = create_test_adapter().await;
        let err = adapter
            .apply(&[
                "CREATE TABLE a (id integer)".to_string(),
                "CREATE TABLE a (id integer)".to_string(),
                "CREATE TABLE b (id integer)".to_string(),
            ])
            .await
            .unwrap_err();

        match err {
            Error::Apply { statement, .. } => assert_eq!(statement, "CREATE TABLE a (id integer)"),
            other => panic!("Expected apply error, got {other:?}"),
        }
        assert_eq!(adapter.dump().await.unwrap(), "");
    }
}
