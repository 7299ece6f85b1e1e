//! End-to-end runs against a SQLite database file.

mod common;
use common::*;

use schemadef::config::Config;
use schemadef::{DatabaseAdapter, Error};
use schemadef_core::GenerateOptions;

const USERS: &str = "CREATE TABLE users (id integer NOT NULL, name text, age integer);";
const USERS_AND_BIGDATA: &str = "CREATE TABLE users (id integer NOT NULL, name text, age integer);\n\
                                 CREATE TABLE bigdata (data integer);";

// ============================================================================
// Transcripts
// ============================================================================

#[tokio::test]
async fn test_empty_database_and_empty_schema() {
    let (_dir, runner) = runner().await;
    assert_eq!(run(&runner, "").await, "-- No table exists --\n");
}

#[tokio::test]
async fn test_create_then_nothing_modified() {
    let (_dir, runner) = runner().await;
    assert_eq!(
        run(&runner, USERS).await,
        applied("CREATE TABLE users (id integer NOT NULL, name text, age integer);\n")
    );
    assert_eq!(run(&runner, USERS).await, "-- Nothing is modified --\n");
}

#[tokio::test]
async fn test_drop_table() {
    let (_dir, runner) = runner().await;
    run(&runner, USERS_AND_BIGDATA).await;
    assert_eq!(run(&runner, USERS).await, applied("DROP TABLE `bigdata`;\n"));
    assert_eq!(run(&runner, USERS).await, "-- Nothing is modified --\n");
}

#[tokio::test]
async fn test_view_follows_column_drop() {
    let (_dir, runner) = runner().await;
    run(
        &runner,
        "CREATE TABLE users (id integer, name text, age integer);\n\
         CREATE VIEW adults AS SELECT id, name FROM users WHERE age >= 18;",
    )
    .await;

    let desired = "CREATE TABLE users (id integer, name text);\n\
                   CREATE VIEW named AS SELECT id, name FROM users;";
    assert_eq!(
        run(&runner, desired).await,
        applied(
            "DROP VIEW `adults`;\n\
             ALTER TABLE `users` DROP COLUMN `age`;\n\
             CREATE VIEW named AS SELECT id, name FROM users;\n"
        )
    );
    assert_eq!(run(&runner, desired).await, "-- Nothing is modified --\n");
}

#[tokio::test]
async fn test_dry_run_executes_nothing() {
    let (_dir, runner) = runner().await;
    let transcript = runner.run(USERS, true).await.unwrap();
    assert_eq!(
        transcript,
        "-- dry run --\nCREATE TABLE users (id integer NOT NULL, name text, age integer);\n"
    );
    assert_eq!(runner.export().await.unwrap(), "-- No table exists --\n");
}

#[tokio::test]
async fn test_export() {
    let (_dir, runner) = runner().await;
    run(
        &runner,
        "CREATE TABLE users (id integer, name text);\nCREATE INDEX users_name ON users (name);",
    )
    .await;
    assert_eq!(
        runner.export().await.unwrap(),
        "CREATE TABLE users (id integer, name text);\n\nCREATE INDEX users_name ON users (name);\n"
    );
}

// ============================================================================
// Options
// ============================================================================

#[tokio::test]
async fn test_skip_drop_keeps_table() {
    let (_dir, runner) = runner_with(GenerateOptions { skip_drop: true }).await;
    run(&runner, USERS_AND_BIGDATA).await;

    let skipped = applied("-- Skipped: DROP TABLE `bigdata`;\n");
    assert_eq!(run(&runner, USERS).await, skipped);
    assert!(runner.export().await.unwrap().contains("bigdata"));
    // The table is still there, so the next run reports the same skip.
    assert_eq!(run(&runner, USERS).await, skipped);
}

#[tokio::test]
async fn test_config_skips_tables() {
    let (_dir, runner) = runner().await;
    run(&runner, USERS_AND_BIGDATA).await;

    let config: Config = serde_json::from_str(r#"{ "skip_tables": ["big.*"] }"#).unwrap();
    let runner = runner.with_filter(config.filter().unwrap());
    assert_eq!(run(&runner, USERS).await, "-- Nothing is modified --\n");
    assert!(runner.export().await.unwrap().contains("bigdata"));
}

#[tokio::test]
async fn test_config_file() {
    let (dir, runner) = runner().await;
    run(&runner, USERS_AND_BIGDATA).await;

    let path = dir.path().join("schemadef.json");
    std::fs::write(&path, r#"{ "target_tables": ["users"] }"#).unwrap();
    let runner = runner.with_filter(Config::load(&path).unwrap().filter().unwrap());
    assert_eq!(
        run(&runner, "CREATE TABLE users (id integer NOT NULL, name text);").await,
        applied("ALTER TABLE `users` DROP COLUMN `age`;\n")
    );
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_failed_statement_rolls_back_the_run() {
    let (_dir, runner) = runner().await;
    run(&runner, "CREATE TABLE t (a integer);").await;
    runner
        .adapter()
        .apply(&["INSERT INTO t (a) VALUES (1)".to_string()])
        .await
        .unwrap();

    // SQLite refuses a NOT NULL column without default on a non-empty table.
    let err = runner
        .run(
            "CREATE TABLE t (a integer, b integer NOT NULL);\nCREATE TABLE u (id integer);",
            false,
        )
        .await
        .unwrap_err();
    match err {
        Error::Apply { statement, .. } => {
            assert_eq!(statement, "ALTER TABLE `t` ADD COLUMN `b` INTEGER NOT NULL");
        }
        other => panic!("Expected apply error, got {other:?}"),
    }

    assert_eq!(
        runner.export().await.unwrap(),
        "CREATE TABLE t (a integer);\n"
    );
}

#[tokio::test]
async fn test_invalid_desired_schema() {
    let (_dir, runner) = runner().await;
    let err = runner.run("CREATE TABLE (", false).await.unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
    assert_eq!(runner.export().await.unwrap(), "-- No table exists --\n");
}
