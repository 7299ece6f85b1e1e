//! DDL statement AST types.

use super::types::TypeName;
use crate::lexer::TokenKind;

/// An identifier as written, before dialect case folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// The identifier text with quotes removed.
    pub value: String,
    /// Whether it was written in double quotes or backticks.
    pub quoted: bool,
}

impl Ident {
    /// Creates an unquoted identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    /// Creates a quoted identifier.
    #[must_use]
    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }
}

/// A possibly schema-qualified object name (`schema.name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Optional schema qualifier.
    pub schema: Option<Ident>,
    /// Object name.
    pub name: Ident,
}

/// A captured run of tokens for an expression we compare but do not
/// interpret: defaults, CHECK bodies, index predicates, view queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment(pub Vec<TokenKind>);

impl Fragment {
    /// Returns true if the fragment holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferentialAction {
    /// CASCADE.
    Cascade,
    /// RESTRICT.
    Restrict,
    /// SET NULL.
    SetNull,
    /// SET DEFAULT.
    SetDefault,
    /// NO ACTION.
    NoAction,
}

impl ReferentialAction {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::NoAction => "NO ACTION",
        }
    }
}

/// `REFERENCES table [(columns)] [ON DELETE ..] [ON UPDATE ..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: QualifiedName,
    /// Referenced columns; empty means the referenced primary key.
    pub columns: Vec<Ident>,
    /// ON DELETE action.
    pub on_delete: Option<ReferentialAction>,
    /// ON UPDATE action.
    pub on_update: Option<ReferentialAction>,
}

/// A column reference inside an index or key definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedColumn {
    /// Column name.
    pub name: Ident,
    /// Whether `DESC` was given.
    pub descending: bool,
}

/// A constraint written inline on a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnConstraint {
    /// PRIMARY KEY [ASC|DESC] [AUTOINCREMENT].
    PrimaryKey {
        /// Whether AUTOINCREMENT followed the key.
        autoincrement: bool,
    },
    /// NOT NULL.
    NotNull,
    /// NULL.
    Null,
    /// UNIQUE.
    Unique,
    /// CHECK (expr).
    Check(Fragment),
    /// DEFAULT expr.
    Default(Fragment),
    /// REFERENCES ...
    References(ForeignKeyRef),
    /// AUTOINCREMENT or AUTO_INCREMENT on its own.
    Autoincrement,
    /// COLLATE name.
    Collate(Ident),
}

/// A column constraint with its optional `CONSTRAINT name` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnConstraintDef {
    /// Explicit constraint name.
    pub name: Option<Ident>,
    /// The constraint.
    pub kind: ColumnConstraint,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name.
    pub name: Ident,
    /// Declared type; `None` for typeless SQLite columns.
    pub data_type: Option<TypeName>,
    /// Inline constraints in source order.
    pub constraints: Vec<ColumnConstraintDef>,
}

/// A table-level constraint (or MySQL inline index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    /// PRIMARY KEY (cols).
    PrimaryKey(Vec<IndexedColumn>),
    /// UNIQUE (cols).
    Unique(Vec<IndexedColumn>),
    /// FOREIGN KEY (cols) REFERENCES ...
    ForeignKey {
        /// Referencing columns.
        columns: Vec<Ident>,
        /// Referenced target.
        reference: ForeignKeyRef,
    },
    /// CHECK (expr).
    Check(Fragment),
    /// MySQL `INDEX name (cols)` / `KEY name (cols)` inside CREATE TABLE.
    Index(Vec<IndexedColumn>),
}

/// A table constraint with its optional name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConstraintDef {
    /// Explicit constraint or index name.
    pub name: Option<Ident>,
    /// The constraint.
    pub kind: TableConstraint,
}

/// CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    /// Table name.
    pub name: QualifiedName,
    /// IF NOT EXISTS.
    pub if_not_exists: bool,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Table-level constraints in declaration order.
    pub constraints: Vec<TableConstraintDef>,
    /// The statement text as written, without the terminating semicolon.
    pub source: String,
}

/// CREATE INDEX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexStatement {
    /// Index name.
    pub name: QualifiedName,
    /// Indexed table.
    pub table: QualifiedName,
    /// UNIQUE.
    pub unique: bool,
    /// IF NOT EXISTS.
    pub if_not_exists: bool,
    /// Indexed columns in order.
    pub columns: Vec<IndexedColumn>,
    /// Partial index predicate.
    pub predicate: Option<Fragment>,
    /// The statement text as written.
    pub source: String,
}

/// CREATE VIEW.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateViewStatement {
    /// View name.
    pub name: QualifiedName,
    /// OR REPLACE.
    pub or_replace: bool,
    /// The defining query.
    pub query: Fragment,
    /// The statement text as written.
    pub source: String,
}

/// DROP TABLE / DROP VIEW.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropStatement {
    /// Object name.
    pub name: QualifiedName,
    /// IF EXISTS.
    pub if_exists: bool,
}

/// DROP INDEX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndexStatement {
    /// Index name.
    pub name: QualifiedName,
    /// MySQL `ON table`.
    pub table: Option<QualifiedName>,
    /// IF EXISTS.
    pub if_exists: bool,
}

/// Placement of an added or modified column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    /// FIRST.
    First,
    /// AFTER column.
    After(Ident),
}

/// A change applied by `ALTER TABLE .. ALTER COLUMN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterColumnChange {
    /// TYPE t / SET DATA TYPE t.
    SetType(TypeName),
    /// SET NOT NULL.
    SetNotNull,
    /// DROP NOT NULL.
    DropNotNull,
    /// SET DEFAULT expr.
    SetDefault(Fragment),
    /// DROP DEFAULT.
    DropDefault,
}

/// One action of an ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterAction {
    /// ADD [COLUMN] def [FIRST | AFTER c].
    AddColumn {
        /// New column.
        column: ColumnDef,
        /// Requested placement.
        position: Option<ColumnPosition>,
    },
    /// ADD [CONSTRAINT n] ... / ADD INDEX ...
    AddConstraint(TableConstraintDef),
    /// DROP [COLUMN] c.
    DropColumn(Ident),
    /// DROP CONSTRAINT n / DROP FOREIGN KEY n / DROP CHECK n.
    DropConstraint(Ident),
    /// DROP INDEX n / DROP KEY n.
    DropIndex(Ident),
    /// DROP PRIMARY KEY.
    DropPrimaryKey,
    /// ALTER [COLUMN] c ...
    AlterColumn {
        /// Column name.
        column: Ident,
        /// The change.
        change: AlterColumnChange,
    },
    /// MODIFY [COLUMN] def [FIRST | AFTER c].
    ModifyColumn {
        /// Replacement definition.
        column: ColumnDef,
        /// Requested placement.
        position: Option<ColumnPosition>,
    },
    /// RENAME TO name.
    RenameTable(QualifiedName),
    /// RENAME [COLUMN] a TO b.
    RenameColumn {
        /// Old name.
        from: Ident,
        /// New name.
        to: Ident,
    },
}

/// ALTER TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableStatement {
    /// Table name.
    pub name: QualifiedName,
    /// Actions in source order.
    pub actions: Vec<AlterAction>,
}

/// A parsed DDL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// CREATE TABLE.
    CreateTable(CreateTableStatement),
    /// CREATE INDEX.
    CreateIndex(CreateIndexStatement),
    /// CREATE VIEW.
    CreateView(CreateViewStatement),
    /// DROP TABLE.
    DropTable(DropStatement),
    /// DROP VIEW.
    DropView(DropStatement),
    /// DROP INDEX.
    DropIndex(DropIndexStatement),
    /// ALTER TABLE.
    AlterTable(AlterTableStatement),
    /// A statement of another kind, kept verbatim.
    Opaque(String),
}
