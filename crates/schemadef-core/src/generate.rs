//! DDL generation.
//!
//! Renders [`Operation`]s as dialect-specific statements. Entities that were
//! not altered after creation are echoed with the text they were declared
//! with; everything else is rendered canonically with every identifier
//! quoted.

use core::fmt;
use std::collections::HashSet;

use tracing::debug;

use crate::ast::DataType;
use crate::diff::{self, Operation, Placement};
use crate::dialect::{Dialect, ModifyStrategy};
use crate::error::{Error, Result};
use crate::lexer::{Keyword, Lexer, TokenKind};
use crate::schema::{Column, Constraint, ConstraintKind, ForeignKey, Index, Snapshot, Table, View};

/// Generation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Render destructive statements as comments instead of executing them.
    pub skip_drop: bool,
}

/// One generated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ddl {
    /// Statement text without the terminating semicolon.
    pub sql: String,
    /// The statement is shown but must not be executed.
    pub skipped: bool,
}

impl fmt::Display for Ddl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            write!(f, "-- Skipped: {};", self.sql)
        } else {
            write!(f, "{};", self.sql)
        }
    }
}

/// Outcome of comparing two schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Statements to run, in order.
    Apply(Vec<Ddl>),
    /// The schemas already match.
    NothingModified,
    /// The schemas match and the current one has no tables at all.
    NoTableExists,
}

impl Plan {
    /// All statements, skipped ones included.
    #[must_use]
    pub fn statements(&self) -> &[Ddl] {
        match self {
            Self::Apply(ddls) => ddls,
            Self::NothingModified | Self::NoTableExists => &[],
        }
    }

    /// Statements to execute, without their terminators.
    pub fn executable(&self) -> impl Iterator<Item = &str> {
        self.statements()
            .iter()
            .filter(|ddl| !ddl.skipped)
            .map(|ddl| ddl.sql.as_str())
    }
}

/// What a drop and its matching re-creation act on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntityKey {
    Table(String),
    Column(String, String),
    Index(String, String),
    Constraint(String, String),
    View(String),
}

fn entity_key(op: &Operation) -> EntityKey {
    match op {
        Operation::CreateTable { table } => EntityKey::Table(table.name.clone()),
        Operation::DropTable { name } => EntityKey::Table(name.clone()),
        Operation::AddColumn { table, column, .. } => {
            EntityKey::Column(table.clone(), column.name.clone())
        }
        Operation::DropColumn { table, column } => EntityKey::Column(table.clone(), column.clone()),
        Operation::ModifyColumn { table, to, .. } => {
            EntityKey::Column(table.clone(), to.name.clone())
        }
        Operation::AddIndex { index } | Operation::DropIndex { index } => {
            EntityKey::Index(index.table.clone(), index.name.clone())
        }
        Operation::AddConstraint { table, constraint }
        | Operation::DropConstraint { table, constraint } => {
            EntityKey::Constraint(table.clone(), constraint.name.clone())
        }
        Operation::CreateView { view } => EntityKey::View(view.name.clone()),
        Operation::DropView { name } => EntityKey::View(name.clone()),
    }
}

/// Renders operations for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Generator {
    dialect: Dialect,
    options: GenerateOptions,
}

impl Generator {
    /// Creates a generator.
    #[must_use]
    pub const fn new(dialect: Dialect, options: GenerateOptions) -> Self {
        Self { dialect, options }
    }

    /// Renders every operation in order.
    ///
    /// With `skip_drop`, destructive statements are marked skipped, and so
    /// are the re-creations of entities whose drop was skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedConstruct`] if an operation cannot be
    /// expressed in the dialect.
    pub fn generate(&self, operations: &[Operation]) -> Result<Vec<Ddl>> {
        let mut skipped_drops = HashSet::new();
        let mut ddls = Vec::with_capacity(operations.len());

        for op in operations {
            let sql = self.render(op)?;
            let skipped = if !self.options.skip_drop {
                false
            } else if op.is_destructive() {
                skipped_drops.insert(entity_key(op));
                true
            } else {
                skipped_drops.contains(&entity_key(op))
            };
            if skipped {
                debug!(sql = %sql, "skipping statement");
            }
            ddls.push(Ddl { sql, skipped });
        }
        Ok(ddls)
    }

    /// Renders one operation as a statement without its terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedConstruct`] if the dialect cannot express
    /// the operation.
    pub fn render(&self, op: &Operation) -> Result<String> {
        match op {
            Operation::CreateTable { table } => match &table.source {
                Some(source) => Ok(source.clone()),
                None => self.create_table(table),
            },
            Operation::DropTable { name } => Ok(format!("DROP TABLE {}", self.name(name))),
            Operation::AddColumn {
                table,
                column,
                position,
                constraints,
            } => {
                if column.autoincrement && self.dialect == Dialect::Sqlite {
                    return Err(self.unsupported(format!(
                        "adding autoincrement column {table}.{}",
                        column.name
                    )));
                }
                let mut definition = self.column_definition(column);
                for constraint in constraints {
                    definition.push(' ');
                    definition.push_str(&self.column_constraint(constraint));
                }
                Ok(format!(
                    "ALTER TABLE {} ADD COLUMN {definition}{}",
                    self.name(table),
                    self.placement(position.as_ref())
                ))
            }
            Operation::DropColumn { table, column } => Ok(format!(
                "ALTER TABLE {} DROP COLUMN {}",
                self.name(table),
                self.ident(column)
            )),
            Operation::ModifyColumn {
                table,
                from,
                to,
                position,
            } => self.modify_column(table, from, to, position.as_ref()),
            Operation::AddIndex { index } => {
                self.check_partial_index(index)?;
                match &index.source {
                    Some(source) => Ok(source.clone()),
                    None => self.create_index(index),
                }
            }
            Operation::DropIndex { index } => Ok(self.drop_index(index)),
            Operation::AddConstraint { table, constraint } => {
                self.add_constraint(table, constraint)
            }
            Operation::DropConstraint { table, constraint } => {
                self.drop_constraint(table, constraint)
            }
            Operation::CreateView { view } => Ok(match &view.source {
                Some(source) => source.clone(),
                None => self.create_view(view),
            }),
            Operation::DropView { name } => Ok(format!("DROP VIEW {}", self.name(name))),
        }
    }

    // ================================================================
    // Tables and columns
    // ================================================================

    fn create_table(&self, table: &Table) -> Result<String> {
        let inline_key = self.sqlite_autoincrement_key(table)?;

        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let mut line = self.column_definition(column);
                if let Some(pk) = inline_key.filter(|pk| pk.kind.columns()[0] == column.name) {
                    line.push_str(&format!(
                        " CONSTRAINT {} PRIMARY KEY AUTOINCREMENT",
                        self.ident(&pk.name)
                    ));
                }
                line
            })
            .collect();
        lines.extend(
            table
                .constraints
                .values()
                .filter(|c| inline_key.map_or(true, |pk| pk.name != c.name))
                .map(|c| self.constraint_definition(c)),
        );

        Ok(format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.name(&table.name),
            lines.join(",\n  ")
        ))
    }

    /// SQLite spells autoincrement only as part of a single-column primary
    /// key declared on the column itself.
    fn sqlite_autoincrement_key<'t>(&self, table: &'t Table) -> Result<Option<&'t Constraint>> {
        if self.dialect != Dialect::Sqlite {
            return Ok(None);
        }
        let Some(column) = table.columns.iter().find(|c| c.autoincrement) else {
            return Ok(None);
        };
        match table.primary_key() {
            Some(pk) if pk.kind.columns() == [column.name.clone()] => Ok(Some(pk)),
            _ => Err(self.unsupported(format!(
                "autoincrement column {}.{} outside a single-column primary key",
                table.name, column.name
            ))),
        }
    }

    fn column_definition(&self, column: &Column) -> String {
        let mut sql = self.ident(&column.name);
        let data_type = self.dialect.type_sql(&column.data_type, column.autoincrement);
        if column.data_type != DataType::Unspecified {
            sql.push(' ');
            sql.push_str(&data_type);
        }
        if let Some(collation) = &column.collation {
            sql.push_str(&format!(" COLLATE {}", self.ident(collation)));
        }
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(&format!(" DEFAULT {}", default_sql(default)));
        }
        if column.autoincrement && self.dialect == Dialect::Mysql {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }

    fn placement(&self, position: Option<&Placement>) -> String {
        match position {
            None => String::new(),
            Some(Placement::First) => " FIRST".to_string(),
            Some(Placement::After(column)) => format!(" AFTER {}", self.ident(column)),
        }
    }

    fn modify_column(
        &self,
        table: &str,
        from: &Column,
        to: &Column,
        position: Option<&Placement>,
    ) -> Result<String> {
        match self.dialect.profile().modify_strategy {
            ModifyStrategy::Modify => Ok(format!(
                "ALTER TABLE {} MODIFY COLUMN {}{}",
                self.name(table),
                self.column_definition(to),
                self.placement(position)
            )),
            ModifyStrategy::AlterColumn => {
                if from.autoincrement != to.autoincrement {
                    return Err(self.unsupported(format!(
                        "changing autoincrement of column {table}.{}",
                        to.name
                    )));
                }
                let column = self.ident(&to.name);
                let mut clauses = Vec::new();
                if from.data_type != to.data_type || from.collation != to.collation {
                    let mut clause = format!(
                        "ALTER COLUMN {column} TYPE {}",
                        self.dialect.type_sql(&to.data_type, false)
                    );
                    if let Some(collation) = &to.collation {
                        clause.push_str(&format!(" COLLATE {}", self.ident(collation)));
                    }
                    clauses.push(clause);
                }
                if from.nullable != to.nullable {
                    clauses.push(if to.nullable {
                        format!("ALTER COLUMN {column} DROP NOT NULL")
                    } else {
                        format!("ALTER COLUMN {column} SET NOT NULL")
                    });
                }
                if from.default != to.default {
                    clauses.push(match &to.default {
                        Some(default) => {
                            format!("ALTER COLUMN {column} SET DEFAULT {}", default_sql(default))
                        }
                        None => format!("ALTER COLUMN {column} DROP DEFAULT"),
                    });
                }
                if clauses.is_empty() {
                    return Err(self.unsupported(format!(
                        "repositioning column {table}.{}",
                        to.name
                    )));
                }
                Ok(format!(
                    "ALTER TABLE {} {}",
                    self.name(table),
                    clauses.join(", ")
                ))
            }
            ModifyStrategy::DropAndAdd => Err(self.unsupported(format!(
                "modifying column {table}.{} in place",
                to.name
            ))),
        }
    }

    // ================================================================
    // Indexes and constraints
    // ================================================================

    fn check_partial_index(&self, index: &Index) -> Result<()> {
        if index.predicate.is_some() && !self.dialect.profile().partial_indexes {
            return Err(self.unsupported(format!("partial index {}", index.name)));
        }
        Ok(())
    }

    fn create_index(&self, index: &Index) -> Result<String> {
        self.check_partial_index(index)?;
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|c| {
                if c.descending {
                    format!("{} DESC", self.ident(&c.name))
                } else {
                    self.ident(&c.name)
                }
            })
            .collect();
        let mut sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.name(&index.name),
            self.name(&index.table),
            columns.join(", ")
        );
        if let Some(predicate) = &index.predicate {
            sql.push_str(&format!(" WHERE {predicate}"));
        }
        Ok(sql)
    }

    fn drop_index(&self, index: &Index) -> String {
        if self.dialect.profile().table_scoped_index_names {
            format!(
                "DROP INDEX {} ON {}",
                self.name(&index.name),
                self.name(&index.table)
            )
        } else {
            format!("DROP INDEX {}", self.name(&index.name))
        }
    }

    fn constraint_definition(&self, constraint: &Constraint) -> String {
        let body = self.constraint_body(&constraint.kind);
        match constraint.kind {
            ConstraintKind::PrimaryKey { .. }
                if self.dialect.profile().primary_key_name.is_some() =>
            {
                body
            }
            _ => format!("CONSTRAINT {} {body}", self.ident(&constraint.name)),
        }
    }

    fn constraint_body(&self, kind: &ConstraintKind) -> String {
        match kind {
            ConstraintKind::PrimaryKey { columns } => {
                format!("PRIMARY KEY ({})", self.ident_list(columns))
            }
            ConstraintKind::Unique { columns } => format!("UNIQUE ({})", self.ident_list(columns)),
            ConstraintKind::ForeignKey(fk) => self.foreign_key(fk),
            ConstraintKind::Check { expression } => format!("CHECK ({expression})"),
        }
    }

    /// A constraint written inside a column definition.
    fn column_constraint(&self, constraint: &Constraint) -> String {
        let body = match &constraint.kind {
            ConstraintKind::ForeignKey(fk) => self.references(fk),
            kind => self.constraint_body(kind),
        };
        format!("CONSTRAINT {} {body}", self.ident(&constraint.name))
    }

    fn foreign_key(&self, fk: &ForeignKey) -> String {
        format!(
            "FOREIGN KEY ({}) {}",
            self.ident_list(&fk.columns),
            self.references(fk)
        )
    }

    fn references(&self, fk: &ForeignKey) -> String {
        let mut sql = format!(
            "REFERENCES {} ({})",
            self.name(&fk.ref_table),
            self.ident_list(&fk.ref_columns)
        );
        if let Some(action) = fk.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_str()));
        }
        if let Some(action) = fk.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.as_str()));
        }
        sql
    }

    fn add_constraint(&self, table: &str, constraint: &Constraint) -> Result<String> {
        if !self.dialect.profile().alter_constraints {
            return Err(self.unsupported(format!(
                "adding constraint {} to existing table {table}",
                constraint.name
            )));
        }
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.name(table),
            self.constraint_definition(constraint)
        ))
    }

    fn drop_constraint(&self, table: &str, constraint: &Constraint) -> Result<String> {
        if !self.dialect.profile().alter_constraints {
            return Err(self.unsupported(format!(
                "dropping constraint {} from table {table}",
                constraint.name
            )));
        }
        let name = self.ident(&constraint.name);
        let action = if self.dialect == Dialect::Mysql {
            match constraint.kind {
                ConstraintKind::PrimaryKey { .. } => "DROP PRIMARY KEY".to_string(),
                ConstraintKind::Unique { .. } => format!("DROP INDEX {name}"),
                ConstraintKind::ForeignKey(_) => format!("DROP FOREIGN KEY {name}"),
                ConstraintKind::Check { .. } => format!("DROP CHECK {name}"),
            }
        } else {
            format!("DROP CONSTRAINT {name}")
        };
        Ok(format!("ALTER TABLE {} {action}", self.name(table)))
    }

    // ================================================================
    // Views
    // ================================================================

    fn create_view(&self, view: &View) -> String {
        format!("CREATE VIEW {} AS {}", self.name(&view.name), view.definition)
    }

    // ================================================================
    // Helpers
    // ================================================================

    fn name(&self, name: &str) -> String {
        self.dialect.quote_name(name)
    }

    fn ident(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    fn ident_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.ident(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn unsupported(&self, construct: String) -> Error {
        Error::UnsupportedConstruct {
            dialect: self.dialect.name(),
            construct,
        }
    }
}

/// Wraps a default expression in parentheses unless it reads back as a
/// plain DEFAULT term.
fn default_sql(expression: &str) -> String {
    let tokens: Vec<TokenKind> = Lexer::new(expression)
        .tokenize()
        .into_iter()
        .map(|t| t.kind)
        .filter(|kind| *kind != TokenKind::Eof)
        .collect();
    let unsigned = match tokens.as_slice() {
        [TokenKind::Minus | TokenKind::Plus, rest @ ..] => rest,
        all => all,
    };
    let simple = match unsigned {
        [TokenKind::Number(_)
        | TokenKind::String(_)
        | TokenKind::Blob(_)
        | TokenKind::Identifier(_)
        | TokenKind::QuotedIdentifier(_)
        | TokenKind::Keyword(Keyword::Null | Keyword::True | Keyword::False)] => true,
        [TokenKind::Identifier(_), TokenKind::LeftParen, .., TokenKind::RightParen] => {
            closes_at_end(&unsigned[1..])
        }
        _ => false,
    };
    if simple {
        expression.to_string()
    } else {
        format!("({expression})")
    }
}

/// Returns true if the group opened by the first token closes at the last.
fn closes_at_end(tokens: &[TokenKind]) -> bool {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == tokens.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Diffs two snapshots and renders the result.
///
/// # Errors
///
/// Fails if either snapshot is invalid or an operation cannot be rendered.
pub fn plan(
    dialect: Dialect,
    current: &Snapshot,
    desired: &Snapshot,
    options: &GenerateOptions,
) -> Result<Plan> {
    let operations = diff::diff(dialect, current, desired)?;
    if operations.is_empty() {
        return Ok(if current.has_no_tables() {
            Plan::NoTableExists
        } else {
            Plan::NothingModified
        });
    }
    let ddls = Generator::new(dialect, *options).generate(&operations)?;
    Ok(Plan::Apply(ddls))
}

/// Renders a whole snapshot as canonical DDL, one terminated statement per
/// line group: tables with their indexes, then views, then pass-through
/// statements.
///
/// # Errors
///
/// Returns [`Error::UnsupportedConstruct`] if an entity cannot be expressed
/// in the dialect.
pub fn render_snapshot(dialect: Dialect, snapshot: &Snapshot) -> Result<String> {
    let generator = Generator::new(dialect, GenerateOptions::default());
    let mut out = String::new();
    for table in snapshot.tables.values() {
        out.push_str(&generator.create_table(table)?);
        out.push_str(";\n");
        for index in table.indexes.values() {
            out.push_str(&generator.create_index(index)?);
            out.push_str(";\n");
        }
    }
    for view in snapshot.views.values() {
        out.push_str(&generator.create_view(view));
        out.push_str(";\n");
    }
    for statement in &snapshot.opaque {
        out.push_str(statement);
        out.push_str(";\n");
    }
    Ok(out)
}
