//! Abstract syntax tree for DDL statements.

mod statement;
mod types;

pub use statement::{
    AlterAction, AlterColumnChange, AlterTableStatement, ColumnConstraint, ColumnConstraintDef,
    ColumnDef, ColumnPosition, CreateIndexStatement, CreateTableStatement, CreateViewStatement,
    DropIndexStatement, DropStatement, ForeignKeyRef, Fragment, Ident, IndexedColumn,
    QualifiedName, ReferentialAction, Statement, TableConstraint, TableConstraintDef,
};
pub use types::{DataType, TypeName};
