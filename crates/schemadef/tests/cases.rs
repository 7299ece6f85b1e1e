//! Data-driven runs against a real SQLite database.
//!
//! Each case in `cases.json` applies `current`, checks that applying
//! `desired` prints `output`, and checks that a second run is a no-op.

mod common;
use common::*;

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Case {
    current: String,
    desired: String,
    output: String,
}

fn load_cases() -> BTreeMap<String, Case> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/cases.json");
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn settled(desired: &str) -> &'static str {
    if schemadef_core::parse_schema(schemadef_core::Dialect::Sqlite, desired)
        .unwrap()
        .has_no_tables()
    {
        "-- No table exists --\n"
    } else {
        "-- Nothing is modified --\n"
    }
}

#[tokio::test]
async fn sqlite_cases() {
    for (name, case) in load_cases() {
        let (_dir, runner) = runner().await;
        if !case.current.is_empty() {
            run(&runner, &case.current).await;
        }

        let expected = if case.output.is_empty() {
            settled(&case.desired).to_string()
        } else {
            applied(&case.output)
        };
        assert_eq!(run(&runner, &case.desired).await, expected, "case {name}");
        assert_eq!(
            run(&runner, &case.desired).await,
            settled(&case.desired),
            "case {name} is not idempotent"
        );
    }
}
