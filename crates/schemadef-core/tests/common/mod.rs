#![allow(dead_code)]

use schemadef_core::{
    generate_idempotent_ddls, parse_schema, Dialect, Error, GenerateOptions, Plan, Snapshot,
};

pub fn snapshot(dialect: Dialect, sql: &str) -> Snapshot {
    parse_schema(dialect, sql).unwrap_or_else(|e| panic!("Failed to build: {sql}\nError: {e:?}"))
}

pub fn plan(dialect: Dialect, current: &str, desired: &str) -> Plan {
    plan_with(dialect, current, desired, GenerateOptions::default())
}

pub fn plan_with(dialect: Dialect, current: &str, desired: &str, options: GenerateOptions) -> Plan {
    generate_idempotent_ddls(dialect, desired, current, &options)
        .unwrap_or_else(|e| panic!("Failed to generate.\n  Current: {current}\n  Desired: {desired}\n  Error: {e:?}"))
}

pub fn plan_err(dialect: Dialect, current: &str, desired: &str) -> Error {
    generate_idempotent_ddls(dialect, desired, current, &GenerateOptions::default())
        .expect_err(&format!("Expected error.\n  Current: {current}\n  Desired: {desired}"))
}

/// Generated statements with their terminators, one per entry.
pub fn ddls(dialect: Dialect, current: &str, desired: &str) -> Vec<String> {
    plan(dialect, current, desired)
        .statements()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Appends the executable statements of the plan to `current`, which is
/// what the schema text looks like after applying them.
pub fn apply(dialect: Dialect, current: &str, desired: &str) -> String {
    let plan = plan(dialect, current, desired);
    let mut applied = current.to_string();
    for sql in plan.executable() {
        applied.push_str("\n");
        applied.push_str(sql);
        applied.push(';');
    }
    applied
}

/// Applies the plan once and checks that a second run has nothing to do.
pub fn assert_idempotent(dialect: Dialect, current: &str, desired: &str) {
    let applied = apply(dialect, current, desired);
    let second = plan(dialect, &applied, desired);
    assert!(
        matches!(second, Plan::NothingModified | Plan::NoTableExists),
        "Not idempotent.\n  Current: {current}\n  Desired: {desired}\n  Applied: {applied}\n  Second:  {second:?}"
    );
}
