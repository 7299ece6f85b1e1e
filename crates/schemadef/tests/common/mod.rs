#![allow(dead_code)]

use schemadef::{Runner, SqliteAdapter};
use schemadef_core::GenerateOptions;
use tempfile::TempDir;

/// A runner over a fresh database file. Keep the directory alive for as long
/// as the runner is used.
pub async fn runner() -> (TempDir, Runner<SqliteAdapter>) {
    runner_with(GenerateOptions::default()).await
}

pub async fn runner_with(options: GenerateOptions) -> (TempDir, Runner<SqliteAdapter>) {
    let dir = tempfile::tempdir().unwrap();
    let adapter = SqliteAdapter::connect(dir.path().join("schemadef.db"))
        .await
        .unwrap();
    (dir, Runner::new(adapter).with_options(options))
}

pub async fn run(runner: &Runner<SqliteAdapter>, desired: &str) -> String {
    runner
        .run(desired, false)
        .await
        .unwrap_or_else(|e| panic!("Run failed.\n  Desired: {desired}\n  Error: {e:?}"))
}

pub fn applied(statements: &str) -> String {
    format!("-- Apply --\n{statements}")
}
