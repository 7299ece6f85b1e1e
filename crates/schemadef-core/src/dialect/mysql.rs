//! MySQL profile.

use super::{CaseFolding, ColumnOrderPolicy, ModifyStrategy, Profile, UnknownStatementPolicy};
use crate::ast::DataType;

pub(super) const PROFILE: Profile = Profile {
    name: "mysql",
    quote: '`',
    case_folding: CaseFolding::Preserve,
    hash_comments: true,
    default_schema: None,
    modify_strategy: ModifyStrategy::Modify,
    column_order: ColumnOrderPolicy::Reposition,
    alter_constraints: true,
    deferred_foreign_keys: false,
    partial_indexes: false,
    inline_indexes: true,
    table_scoped_index_names: true,
    ignore_integer_width: true,
    primary_key_name: Some("PRIMARY"),
    unknown_statements: UnknownStatementPolicy::Reject,
    type_synonyms: &[
        ("bool", "tinyint"),
        ("boolean", "tinyint"),
        ("integer", "integer"),
        ("int", "integer"),
    ],
    serial_types: &[],
};

pub(super) fn type_sql(data_type: &DataType) -> String {
    match data_type {
        DataType::Double => "DOUBLE".to_string(),
        other => other.to_sql(),
    }
}
