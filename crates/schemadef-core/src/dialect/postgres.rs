//! PostgreSQL profile.

use super::{CaseFolding, ColumnOrderPolicy, ModifyStrategy, Profile, UnknownStatementPolicy};
use crate::ast::DataType;

pub(super) const PROFILE: Profile = Profile {
    name: "postgres",
    quote: '"',
    case_folding: CaseFolding::LowerUnquoted,
    hash_comments: false,
    default_schema: Some("public"),
    modify_strategy: ModifyStrategy::AlterColumn,
    column_order: ColumnOrderPolicy::Ignore,
    alter_constraints: true,
    deferred_foreign_keys: false,
    partial_indexes: true,
    inline_indexes: false,
    table_scoped_index_names: false,
    ignore_integer_width: false,
    primary_key_name: None,
    unknown_statements: UnknownStatementPolicy::Reject,
    type_synonyms: &[
        ("int4", "integer"),
        ("int2", "smallint"),
        ("int8", "bigint"),
        ("float4", "real"),
        ("float8", "double precision"),
        ("timestamptz", "timestamp with time zone"),
        ("timetz", "time with time zone"),
        ("bytea", "blob"),
    ],
    serial_types: &[
        ("serial", "integer"),
        ("serial4", "integer"),
        ("bigserial", "bigint"),
        ("serial8", "bigint"),
        ("smallserial", "smallint"),
        ("serial2", "smallint"),
    ],
};

/// Autoincrement integers are spelled as the matching serial pseudo-type.
pub(super) fn type_sql(data_type: &DataType, autoincrement: bool) -> String {
    match data_type {
        DataType::Smallint if autoincrement => "SMALLSERIAL".to_string(),
        DataType::Integer if autoincrement => "SERIAL".to_string(),
        DataType::Bigint if autoincrement => "BIGSERIAL".to_string(),
        DataType::Blob => "BYTEA".to_string(),
        DataType::Datetime => "TIMESTAMP".to_string(),
        other => other.to_sql(),
    }
}
