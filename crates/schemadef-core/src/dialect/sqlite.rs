//! SQLite profile.

use super::{CaseFolding, ColumnOrderPolicy, ModifyStrategy, Profile, UnknownStatementPolicy};
use crate::ast::DataType;

pub(super) const PROFILE: Profile = Profile {
    name: "sqlite3",
    quote: '`',
    case_folding: CaseFolding::LowerAll,
    hash_comments: false,
    default_schema: Some("main"),
    // No ALTER COLUMN; DROP COLUMN exists since 3.35.
    modify_strategy: ModifyStrategy::DropAndAdd,
    column_order: ColumnOrderPolicy::Ignore,
    alter_constraints: false,
    deferred_foreign_keys: true,
    partial_indexes: true,
    inline_indexes: false,
    table_scoped_index_names: false,
    ignore_integer_width: false,
    primary_key_name: None,
    unknown_statements: UnknownStatementPolicy::PassThrough,
    type_synonyms: &[],
    serial_types: &[],
};

/// Types are affinities in SQLite, so the canonical spelling is used as is.
pub(super) fn type_sql(data_type: &DataType) -> String {
    data_type.to_sql()
}
