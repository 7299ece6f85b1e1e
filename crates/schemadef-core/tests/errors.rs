//! Error taxonomy: every failure stops the pipeline with a typed error.

mod common;
use common::*;

use schemadef_core::{Dialect, EntityKind, Error};

#[test]
fn error_malformed_desired() {
    let err = plan_err(Dialect::Sqlite, "", "CREATE TABLE users (id integer");
    assert!(matches!(err, Error::Parse(_)), "{err:?}");
}

#[test]
fn error_malformed_current() {
    let err = plan_err(Dialect::Postgres, "CREATE TABLE (id integer);", "");
    assert!(matches!(err, Error::Parse(_)), "{err:?}");
}

#[test]
fn error_position_is_reported() {
    let err = plan_err(
        Dialect::Sqlite,
        "",
        "CREATE TABLE a (id integer);\nCREATE TABLE b (id integer,, name text);",
    );
    let Error::Parse(parse) = &err else {
        panic!("Expected parse error, got {err:?}");
    };
    assert_eq!(parse.line, 2);
    assert_eq!(parse.column, 28);
    assert!(parse.to_string().contains("line 2"));
}

#[test]
fn error_rejected_statement_kind() {
    let err = plan_err(
        Dialect::Postgres,
        "",
        "CREATE FUNCTION f() RETURNS integer AS 'select 1' LANGUAGE sql;",
    );
    assert!(matches!(err, Error::Parse(_)), "{err:?}");
}

#[test]
fn error_duplicate_table() {
    let err = plan_err(
        Dialect::Sqlite,
        "",
        "CREATE TABLE t (a integer);\nCREATE TABLE t (b integer);",
    );
    assert!(
        matches!(&err, Error::DuplicateEntity { kind: EntityKind::Table, name } if name == "t"),
        "{err:?}"
    );
}

#[test]
fn error_duplicate_column() {
    let err = plan_err(Dialect::Mysql, "", "CREATE TABLE t (a int, a int);");
    assert!(
        matches!(err, Error::DuplicateEntity { kind: EntityKind::Column, .. }),
        "{err:?}"
    );
}

#[test]
fn error_unknown_table() {
    let err = plan_err(Dialect::Sqlite, "DROP TABLE missing;", "");
    assert!(
        matches!(&err, Error::UnknownEntity { kind: EntityKind::Table, name } if name == "missing"),
        "{err:?}"
    );
}

#[test]
fn if_exists_tolerates_missing_entities() {
    let desired = "DROP TABLE IF EXISTS missing;\nCREATE TABLE t (a integer);";
    assert_eq!(ddls(Dialect::Sqlite, "", desired), ["CREATE TABLE t (a integer);"]);
}

#[test]
fn error_foreign_key_to_missing_table() {
    let err = plan_err(
        Dialect::Postgres,
        "",
        "CREATE TABLE posts (id integer, user_id integer REFERENCES users (id));",
    );
    assert!(matches!(err, Error::InvalidSchema(_)), "{err:?}");
}

#[test]
fn error_foreign_key_to_missing_column() {
    let err = plan_err(
        Dialect::Postgres,
        "",
        "CREATE TABLE users (id integer PRIMARY KEY);\n\
         CREATE TABLE posts (user_id integer REFERENCES users (uid));",
    );
    assert!(matches!(err, Error::InvalidSchema(_)), "{err:?}");
}

#[test]
fn error_unsupported_sqlite_constraint_change() {
    let err = plan_err(
        Dialect::Sqlite,
        "CREATE TABLE t (a integer);",
        "CREATE TABLE t (a integer UNIQUE);",
    );
    assert!(
        matches!(err, Error::UnsupportedConstruct { dialect: "sqlite3", .. }),
        "{err:?}"
    );
}

#[test]
fn error_unsupported_mysql_partial_index() {
    let err = plan_err(
        Dialect::Mysql,
        "CREATE TABLE t (a int);",
        "CREATE TABLE t (a int);\nCREATE INDEX t_a ON t (a) WHERE a > 0;",
    );
    assert!(
        matches!(err, Error::UnsupportedConstruct { dialect: "mysql", .. }),
        "{err:?}"
    );
}
