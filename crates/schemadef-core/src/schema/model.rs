//! Normalized schema entities.

use indexmap::IndexMap;

use crate::ast::{DataType, ReferentialAction};

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Canonical column name.
    pub name: String,
    /// Canonical type.
    pub data_type: DataType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Canonical default expression.
    pub default: Option<String>,
    /// Zero-based ordinal position in the table.
    pub position: usize,
    /// Autoincrement / serial column.
    pub autoincrement: bool,
    /// Explicit collation.
    pub collation: Option<String>,
}

impl Column {
    /// Creates a nullable column without default.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            default: None,
            position: 0,
            autoincrement: false,
            collation: None,
        }
    }

    /// Compares everything except the ordinal position.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_type == other.data_type
            && self.nullable == other.nullable
            && self.default == other.default
            && self.autoincrement == other.autoincrement
            && self.collation == other.collation
    }
}

/// A foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing columns.
    pub columns: Vec<String>,
    /// Referenced table (canonical name).
    pub ref_table: String,
    /// Referenced columns.
    pub ref_columns: Vec<String>,
    /// ON DELETE action; `None` means NO ACTION.
    pub on_delete: Option<ReferentialAction>,
    /// ON UPDATE action; `None` means NO ACTION.
    pub on_update: Option<ReferentialAction>,
}

/// The body of a table constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Primary key.
    PrimaryKey {
        /// Key columns in order.
        columns: Vec<String>,
    },
    /// Unique constraint.
    Unique {
        /// Constrained columns in order.
        columns: Vec<String>,
    },
    /// Foreign key.
    ForeignKey(ForeignKey),
    /// Check constraint.
    Check {
        /// Normalized predicate.
        expression: String,
    },
}

impl ConstraintKind {
    /// Columns of this table the constraint depends on. Check constraints
    /// report none since their expression is not analyzed.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        match self {
            Self::PrimaryKey { columns } | Self::Unique { columns } => columns,
            Self::ForeignKey(fk) => &fk.columns,
            Self::Check { .. } => &[],
        }
    }

    /// Returns true for foreign keys.
    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey(_))
    }
}

/// A named table constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Constraint name (explicit or derived).
    pub name: String,
    /// Constraint body.
    pub kind: ConstraintKind,
}

/// An indexed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Descending order.
    pub descending: bool,
}

/// A named index.
#[derive(Debug, Clone)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Owning table.
    pub table: String,
    /// Indexed columns; order is significant.
    pub columns: Vec<IndexColumn>,
    /// UNIQUE index.
    pub unique: bool,
    /// Normalized partial index predicate.
    pub predicate: Option<String>,
    /// Statement text the index was created with, if it was not declared
    /// inside CREATE TABLE.
    pub source: Option<String>,
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.table == other.table
            && self.columns == other.columns
            && self.unique == other.unique
            && self.predicate == other.predicate
    }
}

impl Eq for Index {}

/// A table.
#[derive(Debug, Clone)]
pub struct Table {
    /// Canonical table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    /// Constraints keyed by name.
    pub constraints: IndexMap<String, Constraint>,
    /// Indexes keyed by name.
    pub indexes: IndexMap<String, Index>,
    /// CREATE TABLE text, dropped once the table is altered.
    pub source: Option<String>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: IndexMap::new(),
            indexes: IndexMap::new(),
            source: None,
        }
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column in declaration order.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The primary key constraint, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints
            .values()
            .find(|c| matches!(c.kind, ConstraintKind::PrimaryKey { .. }))
    }

    /// Foreign keys in declaration order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&Constraint, &ForeignKey)> {
        self.constraints.values().filter_map(|c| match &c.kind {
            ConstraintKind::ForeignKey(fk) => Some((c, fk)),
            _ => None,
        })
    }

    /// Renumbers column positions after an insertion or removal.
    pub fn reindex_columns(&mut self) {
        for (position, column) in self.columns.iter_mut().enumerate() {
            column.position = position;
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.constraints == other.constraints
            && self.indexes == other.indexes
    }
}

impl Eq for Table {}

/// A view.
#[derive(Debug, Clone)]
pub struct View {
    /// Canonical view name.
    pub name: String,
    /// Normalized defining query.
    pub definition: String,
    /// Tables and views the query reads from.
    pub references: Vec<String>,
    /// CREATE VIEW text as written.
    pub source: Option<String>,
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.definition == other.definition
    }
}

impl Eq for View {}

/// A point-in-time schema: tables and views in the order they were declared.
///
/// Equality is structural; statement texts and pass-through statements do
/// not take part in it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Tables keyed by canonical name.
    pub tables: IndexMap<String, Table>,
    /// Views keyed by canonical name.
    pub views: IndexMap<String, View>,
    /// Statements kept verbatim (triggers and the like).
    pub opaque: Vec<String>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the snapshot has no tables.
    #[must_use]
    pub fn has_no_tables(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns true if the snapshot declares nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }

    /// Looks up a table.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Keeps only the tables accepted by `keep`.
    pub fn retain_tables(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.tables.retain(|name, _| keep(name));
    }

    /// Keeps only the views accepted by `keep`.
    pub fn retain_views(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.views.retain(|name, _| keep(name));
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.tables == other.tables && self.views == other.views
    }
}

impl Eq for Snapshot {}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(order: &[&str]) -> Table {
        let mut table = Table::new("users");
        for name in order {
            table.columns.push(Column::new(*name, DataType::Integer));
        }
        table.reindex_columns();
        table
    }

    #[test]
    fn test_same_definition_ignores_position() {
        let a = users(&["id", "age"]);
        let b = users(&["age", "id"]);
        assert!(a.columns[0].same_definition(&b.columns[1]));
        assert_ne!(a.columns[0], b.columns[1]);
    }

    #[test]
    fn test_table_equality_ignores_source() {
        let mut a = users(&["id"]);
        let b = users(&["id"]);
        a.source = Some("CREATE TABLE users (id integer)".into());
        assert_eq!(a, b);
    }

    #[test]
    fn test_constraint_order_is_not_significant() {
        let mut a = users(&["id", "email"]);
        let mut b = a.clone();
        let pk = Constraint {
            name: "users_pkey".into(),
            kind: ConstraintKind::PrimaryKey {
                columns: vec!["id".into()],
            },
        };
        let uq = Constraint {
            name: "users_email_key".into(),
            kind: ConstraintKind::Unique {
                columns: vec!["email".into()],
            },
        };
        a.constraints.insert(pk.name.clone(), pk.clone());
        a.constraints.insert(uq.name.clone(), uq.clone());
        b.constraints.insert(uq.name.clone(), uq);
        b.constraints.insert(pk.name.clone(), pk);
        assert_eq!(a, b);
        assert_eq!(a.primary_key().map(|c| c.name.as_str()), Some("users_pkey"));
    }

    #[test]
    fn test_snapshot_equality_ignores_opaque() {
        let mut a = Snapshot::new();
        let b = Snapshot::new();
        a.opaque.push("CREATE TRIGGER t AFTER INSERT ON x BEGIN SELECT 1; END".into());
        assert_eq!(a, b);
        assert!(a.is_empty());
    }
}
