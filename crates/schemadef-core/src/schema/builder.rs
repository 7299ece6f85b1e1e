//! Folds parsed statements into a [`Snapshot`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::model::{
    Column, Constraint, ConstraintKind, ForeignKey, Index, IndexColumn, Snapshot, Table, View,
};
use crate::ast::{
    AlterAction, AlterColumnChange, AlterTableStatement, ColumnConstraint, ColumnDef,
    ColumnPosition, CreateIndexStatement, CreateTableStatement, CreateViewStatement, DataType,
    DropIndexStatement, DropStatement, ForeignKeyRef, Fragment, Ident, IndexedColumn,
    QualifiedName, ReferentialAction, Statement, TableConstraint, TableConstraintDef,
};
use crate::dialect::Dialect;
use crate::error::{EntityKind, Error, Result};
use crate::lexer::TokenKind;
use crate::normalize::{self, NormalizedType};

/// Builds a snapshot from statements applied in order.
#[derive(Debug)]
pub struct SchemaBuilder {
    dialect: Dialect,
    snapshot: Snapshot,
}

impl SchemaBuilder {
    /// Creates a builder over an empty snapshot.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            snapshot: Snapshot::new(),
        }
    }

    /// Applies one statement.
    ///
    /// # Errors
    ///
    /// Fails on a CREATE of an existing name, a DROP or ALTER of a missing
    /// one, or a table with two primary keys.
    pub fn apply(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::CreateTable(stmt) => self.create_table(stmt),
            Statement::CreateIndex(stmt) => self.create_index(stmt),
            Statement::CreateView(stmt) => self.create_view(stmt),
            Statement::DropTable(stmt) => self.drop_table(stmt),
            Statement::DropView(stmt) => self.drop_view(stmt),
            Statement::DropIndex(stmt) => self.drop_index(stmt),
            Statement::AlterTable(stmt) => self.alter_table(stmt),
            Statement::Opaque(text) => {
                self.snapshot.opaque.push(text.clone());
                Ok(())
            }
        }
    }

    /// Resolves cross-entity references and returns the snapshot.
    ///
    /// Foreign keys without explicit referenced columns point at the
    /// referenced table's primary key; view references are narrowed to
    /// names that exist in the snapshot.
    #[must_use]
    pub fn finish(mut self) -> Snapshot {
        let primary_keys: HashMap<String, Vec<String>> = self
            .snapshot
            .tables
            .iter()
            .filter_map(|(name, table)| {
                table
                    .primary_key()
                    .map(|pk| (name.clone(), pk.kind.columns().to_vec()))
            })
            .collect();

        for table in self.snapshot.tables.values_mut() {
            for constraint in table.constraints.values_mut() {
                if let ConstraintKind::ForeignKey(fk) = &mut constraint.kind {
                    if fk.ref_columns.is_empty() {
                        if let Some(columns) = primary_keys.get(&fk.ref_table) {
                            fk.ref_columns.clone_from(columns);
                        }
                    }
                }
            }
        }

        let names: HashSet<String> = self
            .snapshot
            .tables
            .keys()
            .chain(self.snapshot.views.keys())
            .cloned()
            .collect();
        for view in self.snapshot.views.values_mut() {
            let own = view.name.clone();
            view.references
                .retain(|name| *name != own && names.contains(name));
        }

        self.snapshot
    }

    // ================================================================
    // CREATE
    // ================================================================

    fn create_table(&mut self, stmt: &CreateTableStatement) -> Result<()> {
        let name = normalize::qualified_name(self.dialect, &stmt.name);
        if self.name_taken(&name) {
            if stmt.if_not_exists {
                debug!(table = %name, "table exists, skipping CREATE TABLE IF NOT EXISTS");
                return Ok(());
            }
            return Err(Error::duplicate(EntityKind::Table, name));
        }

        let mut table = Table::new(name.clone());
        table.source = Some(stmt.source.clone());
        for def in &stmt.columns {
            let column = self.column(&mut table, def)?;
            table.columns.push(column);
        }
        table.reindex_columns();
        for def in &stmt.constraints {
            self.add_table_constraint(&mut table, def)?;
        }

        trace!(table = %name, columns = table.columns.len(), "created table");
        self.snapshot.tables.insert(name, table);
        Ok(())
    }

    fn create_index(&mut self, stmt: &CreateIndexStatement) -> Result<()> {
        let table_name = normalize::qualified_name(self.dialect, &stmt.table);
        let name = normalize::identifier(self.dialect, &stmt.name.name);

        let Some(table) = self.snapshot.tables.get(&table_name) else {
            return Err(Error::unknown(EntityKind::Table, table_name));
        };
        if self.index_name_taken(table, &name) {
            if stmt.if_not_exists {
                debug!(index = %name, "index exists, skipping CREATE INDEX IF NOT EXISTS");
                return Ok(());
            }
            return Err(Error::duplicate(EntityKind::Index, name));
        }

        let index = Index {
            name: name.clone(),
            table: table_name.clone(),
            columns: self.index_columns(&stmt.columns),
            unique: stmt.unique,
            predicate: stmt
                .predicate
                .as_ref()
                .map(|p| normalize::expression(self.dialect, p)),
            source: Some(stmt.source.clone()),
        };
        if let Some(table) = self.snapshot.tables.get_mut(&table_name) {
            table.indexes.insert(name, index);
        }
        Ok(())
    }

    fn create_view(&mut self, stmt: &CreateViewStatement) -> Result<()> {
        let name = normalize::qualified_name(self.dialect, &stmt.name);
        let replaces = self.snapshot.views.contains_key(&name);
        if self.snapshot.tables.contains_key(&name) || (replaces && !stmt.or_replace) {
            return Err(Error::duplicate(EntityKind::View, name));
        }

        let view = View {
            name: name.clone(),
            definition: normalize::fragment(self.dialect, &stmt.query),
            references: self.view_candidates(&stmt.query),
            source: Some(stmt.source.clone()),
        };
        self.snapshot.views.insert(name, view);
        Ok(())
    }

    /// Collects every table-like name a view query mentions. `finish`
    /// narrows the list to names that exist.
    fn view_candidates(&self, query: &Fragment) -> Vec<String> {
        let ident = |token: &TokenKind| match token {
            TokenKind::Identifier(v) => Some(Ident::new(v.clone())),
            TokenKind::QuotedIdentifier(v) => Some(Ident::quoted(v.clone())),
            _ => None,
        };

        let tokens = &query.0;
        let mut names = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let Some(first) = ident(&tokens[i]) else {
                i += 1;
                continue;
            };
            let qualified = match (tokens.get(i + 1), tokens.get(i + 2).and_then(ident)) {
                (Some(TokenKind::Dot), Some(name)) => {
                    i += 3;
                    QualifiedName {
                        schema: Some(first),
                        name,
                    }
                }
                _ => {
                    i += 1;
                    QualifiedName {
                        schema: None,
                        name: first,
                    }
                }
            };
            let name = normalize::qualified_name(self.dialect, &qualified);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    // ================================================================
    // DROP
    // ================================================================

    fn drop_table(&mut self, stmt: &DropStatement) -> Result<()> {
        let name = normalize::qualified_name(self.dialect, &stmt.name);
        if self.snapshot.tables.shift_remove(&name).is_none() && !stmt.if_exists {
            return Err(Error::unknown(EntityKind::Table, name));
        }
        Ok(())
    }

    fn drop_view(&mut self, stmt: &DropStatement) -> Result<()> {
        let name = normalize::qualified_name(self.dialect, &stmt.name);
        if self.snapshot.views.shift_remove(&name).is_none() && !stmt.if_exists {
            return Err(Error::unknown(EntityKind::View, name));
        }
        Ok(())
    }

    fn drop_index(&mut self, stmt: &DropIndexStatement) -> Result<()> {
        let name = normalize::identifier(self.dialect, &stmt.name.name);
        let owner = stmt
            .table
            .as_ref()
            .map(|t| normalize::qualified_name(self.dialect, t));

        let removed = self
            .snapshot
            .tables
            .values_mut()
            .filter(|t| owner.as_ref().map_or(true, |o| *o == t.name))
            .any(|t| t.indexes.shift_remove(&name).is_some());

        if !removed && !stmt.if_exists {
            return Err(Error::unknown(EntityKind::Index, name));
        }
        Ok(())
    }

    // ================================================================
    // ALTER
    // ================================================================

    fn alter_table(&mut self, stmt: &AlterTableStatement) -> Result<()> {
        let name = normalize::qualified_name(self.dialect, &stmt.name);
        let Some((position, _, mut table)) = self.snapshot.tables.shift_remove_full(&name) else {
            return Err(Error::unknown(EntityKind::Table, name));
        };

        // An altered table no longer matches the text it was created with.
        table.source = None;
        let mut renamed_columns = Vec::new();
        for action in &stmt.actions {
            self.alter(&mut table, action, &mut renamed_columns)?;
        }

        let new_name = table.name.clone();
        self.snapshot
            .tables
            .shift_insert(position, new_name.clone(), table);

        for other in self.snapshot.tables.values_mut() {
            for constraint in other.constraints.values_mut() {
                let ConstraintKind::ForeignKey(fk) = &mut constraint.kind else {
                    continue;
                };
                if fk.ref_table != name {
                    continue;
                }
                fk.ref_table.clone_from(&new_name);
                for (from, to) in &renamed_columns {
                    rename_in(&mut fk.ref_columns, from, to);
                }
            }
        }
        Ok(())
    }

    fn alter(
        &self,
        table: &mut Table,
        action: &AlterAction,
        renamed_columns: &mut Vec<(String, String)>,
    ) -> Result<()> {
        match action {
            AlterAction::AddColumn { column, position } => {
                let column = self.column(table, column)?;
                let at = self.insert_position(table, position.as_ref())?;
                table.columns.insert(at, column);
                table.reindex_columns();
            }
            AlterAction::AddConstraint(def) => self.add_table_constraint(table, def)?,
            AlterAction::DropColumn(ident) => {
                let name = normalize::identifier(self.dialect, ident);
                let Some(at) = table.column_index(&name) else {
                    return Err(unknown_column(table, &name));
                };
                table.columns.remove(at);
                table.reindex_columns();
                table
                    .constraints
                    .retain(|_, c| !c.kind.columns().contains(&name));
                table
                    .indexes
                    .retain(|_, i| !i.columns.iter().any(|c| c.name == name));
            }
            AlterAction::DropConstraint(ident) => {
                let name = normalize::identifier(self.dialect, ident);
                if table.constraints.shift_remove(&name).is_none() {
                    return Err(Error::unknown(
                        EntityKind::Constraint,
                        format!("{}.{name}", table.name),
                    ));
                }
            }
            AlterAction::DropIndex(ident) => {
                let name = normalize::identifier(self.dialect, ident);
                let removed = table.indexes.shift_remove(&name).is_some()
                    || table.constraints.shift_remove(&name).is_some();
                if !removed {
                    return Err(Error::unknown(EntityKind::Index, name));
                }
            }
            AlterAction::DropPrimaryKey => {
                let Some(name) = table.primary_key().map(|pk| pk.name.clone()) else {
                    return Err(Error::unknown(
                        EntityKind::Constraint,
                        format!("{}.PRIMARY KEY", table.name),
                    ));
                };
                table.constraints.shift_remove(&name);
            }
            AlterAction::AlterColumn { column, change } => {
                let name = normalize::identifier(self.dialect, column);
                let table_name = table.name.clone();
                let Some(column) = table.columns.iter_mut().find(|c| c.name == name) else {
                    return Err(Error::unknown(
                        EntityKind::Column,
                        format!("{table_name}.{name}"),
                    ));
                };
                self.alter_column(column, change);
            }
            AlterAction::ModifyColumn { column, position } => {
                let name = normalize::identifier(self.dialect, &column.name);
                let Some(at) = table.column_index(&name) else {
                    return Err(unknown_column(table, &name));
                };
                table.columns.remove(at);
                let column = self.column(table, column)?;
                let at = match position {
                    Some(position) => self.insert_position(table, Some(position))?,
                    None => at,
                };
                table.columns.insert(at, column);
                table.reindex_columns();
            }
            AlterAction::RenameTable(new_name) => {
                let new_name = normalize::qualified_name(self.dialect, new_name);
                if self.name_taken(&new_name) {
                    return Err(Error::duplicate(EntityKind::Table, new_name));
                }
                for index in table.indexes.values_mut() {
                    index.table.clone_from(&new_name);
                }
                table.name = new_name;
            }
            AlterAction::RenameColumn { from, to } => {
                let from = normalize::identifier(self.dialect, from);
                let to = normalize::identifier(self.dialect, to);
                if table.column(&to).is_some() {
                    return Err(Error::duplicate(
                        EntityKind::Column,
                        format!("{}.{to}", table.name),
                    ));
                }
                let table_name = table.name.clone();
                let Some(column) = table.columns.iter_mut().find(|c| c.name == from) else {
                    return Err(Error::unknown(
                        EntityKind::Column,
                        format!("{table_name}.{from}"),
                    ));
                };
                column.name.clone_from(&to);

                for constraint in table.constraints.values_mut() {
                    match &mut constraint.kind {
                        ConstraintKind::PrimaryKey { columns } | ConstraintKind::Unique { columns } => {
                            rename_in(columns, &from, &to);
                        }
                        ConstraintKind::ForeignKey(fk) => rename_in(&mut fk.columns, &from, &to),
                        ConstraintKind::Check { .. } => {}
                    }
                }
                for index in table.indexes.values_mut() {
                    for column in &mut index.columns {
                        if column.name == from {
                            column.name.clone_from(&to);
                        }
                    }
                }
                renamed_columns.push((from, to));
            }
        }
        Ok(())
    }

    fn alter_column(&self, column: &mut Column, change: &AlterColumnChange) {
        match change {
            AlterColumnChange::SetType(ty) => {
                let ty = normalize::data_type(self.dialect, ty);
                column.data_type = ty.data_type;
                column.autoincrement |= ty.serial;
            }
            AlterColumnChange::SetNotNull => column.nullable = false,
            AlterColumnChange::DropNotNull => column.nullable = true,
            AlterColumnChange::SetDefault(fragment) => {
                let default = normalize::default_value(self.dialect, fragment);
                column.default = default.expression;
                column.autoincrement |= default.autoincrement;
            }
            AlterColumnChange::DropDefault => {
                column.default = None;
                // A sequence-backed column loses its sequence with its default.
                if !self.dialect.profile().serial_types.is_empty() {
                    column.autoincrement = false;
                }
            }
        }
    }

    fn insert_position(&self, table: &Table, position: Option<&ColumnPosition>) -> Result<usize> {
        match position {
            None => Ok(table.columns.len()),
            Some(ColumnPosition::First) => Ok(0),
            Some(ColumnPosition::After(ident)) => {
                let name = normalize::identifier(self.dialect, ident);
                table
                    .column_index(&name)
                    .map(|i| i + 1)
                    .ok_or_else(|| unknown_column(table, &name))
            }
        }
    }

    // ================================================================
    // Columns and constraints
    // ================================================================

    /// Builds a column, registering its inline constraints on `table`.
    fn column(&self, table: &mut Table, def: &ColumnDef) -> Result<Column> {
        let name = normalize::identifier(self.dialect, &def.name);
        if table.column(&name).is_some() {
            return Err(Error::duplicate(
                EntityKind::Column,
                format!("{}.{name}", table.name),
            ));
        }

        let ty = def.data_type.as_ref().map_or(
            NormalizedType {
                data_type: DataType::Unspecified,
                serial: false,
            },
            |t| normalize::data_type(self.dialect, t),
        );
        let mut column = Column::new(name.clone(), ty.data_type);
        if ty.serial {
            column.autoincrement = true;
            column.nullable = false;
        }

        for constraint in &def.constraints {
            let explicit = constraint
                .name
                .as_ref()
                .map(|n| normalize::identifier(self.dialect, n));
            match &constraint.kind {
                ColumnConstraint::PrimaryKey { autoincrement } => {
                    column.nullable = false;
                    column.autoincrement |= *autoincrement;
                    let kind = ConstraintKind::PrimaryKey {
                        columns: vec![name.clone()],
                    };
                    self.add_constraint(table, explicit, kind, None)?;
                }
                ColumnConstraint::NotNull => column.nullable = false,
                ColumnConstraint::Null => {}
                ColumnConstraint::Unique => {
                    let kind = ConstraintKind::Unique {
                        columns: vec![name.clone()],
                    };
                    self.add_constraint(table, explicit, kind, None)?;
                }
                ColumnConstraint::Check(fragment) => {
                    let kind = ConstraintKind::Check {
                        expression: normalize::expression(self.dialect, fragment),
                    };
                    self.add_constraint(table, explicit, kind, Some(&name))?;
                }
                ColumnConstraint::Default(fragment) => {
                    let default = normalize::default_value(self.dialect, fragment);
                    column.default = default.expression;
                    if default.autoincrement {
                        column.autoincrement = true;
                        column.nullable = false;
                    }
                }
                ColumnConstraint::References(reference) => {
                    let kind = ConstraintKind::ForeignKey(
                        self.foreign_key(vec![name.clone()], reference),
                    );
                    self.add_constraint(table, explicit, kind, None)?;
                }
                ColumnConstraint::Autoincrement => column.autoincrement = true,
                ColumnConstraint::Collate(collation) => {
                    column.collation = Some(normalize::identifier(self.dialect, collation));
                }
            }
        }

        Ok(column)
    }

    fn add_table_constraint(&self, table: &mut Table, def: &TableConstraintDef) -> Result<()> {
        let explicit = def
            .name
            .as_ref()
            .map(|n| normalize::identifier(self.dialect, n));
        let names = |columns: &[IndexedColumn]| -> Vec<String> {
            columns
                .iter()
                .map(|c| normalize::identifier(self.dialect, &c.name))
                .collect()
        };

        let kind = match &def.kind {
            TableConstraint::PrimaryKey(columns) => ConstraintKind::PrimaryKey {
                columns: names(columns),
            },
            TableConstraint::Unique(columns) => ConstraintKind::Unique {
                columns: names(columns),
            },
            TableConstraint::ForeignKey { columns, reference } => {
                let columns = columns
                    .iter()
                    .map(|c| normalize::identifier(self.dialect, c))
                    .collect();
                ConstraintKind::ForeignKey(self.foreign_key(columns, reference))
            }
            TableConstraint::Check(fragment) => ConstraintKind::Check {
                expression: normalize::expression(self.dialect, fragment),
            },
            TableConstraint::Index(columns) => {
                let columns = self.index_columns(columns);
                let name = match explicit {
                    Some(name) => name,
                    None => {
                        let stem = format!("{}_{}_idx", base_name(&table.name), joined(&columns));
                        unique_name(&stem, |n| self.index_name_taken(table, n))
                    }
                };
                if self.index_name_taken(table, &name) {
                    return Err(Error::duplicate(EntityKind::Index, name));
                }
                let index = Index {
                    name: name.clone(),
                    table: table.name.clone(),
                    columns,
                    unique: false,
                    predicate: None,
                    source: None,
                };
                table.indexes.insert(name, index);
                return Ok(());
            }
        };

        self.add_constraint(table, explicit, kind, None)
    }

    fn add_constraint(
        &self,
        table: &mut Table,
        explicit: Option<String>,
        kind: ConstraintKind,
        column: Option<&str>,
    ) -> Result<()> {
        let primary = matches!(kind, ConstraintKind::PrimaryKey { .. });
        if primary {
            if table.primary_key().is_some() {
                return Err(Error::InvalidSchema(format!(
                    "table {} has more than one primary key",
                    table.name
                )));
            }
            for key in kind.columns() {
                if let Some(c) = table.columns.iter_mut().find(|c| c.name == *key) {
                    c.nullable = false;
                }
            }
        }

        let name = match (primary, self.dialect.profile().primary_key_name) {
            (true, Some(fixed)) => fixed.to_string(),
            _ => explicit.unwrap_or_else(|| implicit_name(table, &kind, column)),
        };
        if table.constraints.contains_key(&name) {
            return Err(Error::duplicate(
                EntityKind::Constraint,
                format!("{}.{name}", table.name),
            ));
        }
        table.constraints.insert(name.clone(), Constraint { name, kind });
        Ok(())
    }

    fn foreign_key(&self, columns: Vec<String>, reference: &ForeignKeyRef) -> ForeignKey {
        let action = |a: Option<ReferentialAction>| a.filter(|a| *a != ReferentialAction::NoAction);
        ForeignKey {
            columns,
            ref_table: normalize::qualified_name(self.dialect, &reference.table),
            ref_columns: reference
                .columns
                .iter()
                .map(|c| normalize::identifier(self.dialect, c))
                .collect(),
            on_delete: action(reference.on_delete),
            on_update: action(reference.on_update),
        }
    }

    fn index_columns(&self, columns: &[IndexedColumn]) -> Vec<IndexColumn> {
        columns
            .iter()
            .map(|c| IndexColumn {
                name: normalize::identifier(self.dialect, &c.name),
                descending: c.descending,
            })
            .collect()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.snapshot.tables.contains_key(name) || self.snapshot.views.contains_key(name)
    }

    fn index_name_taken(&self, table: &Table, name: &str) -> bool {
        if table.indexes.contains_key(name) {
            return true;
        }
        !self.dialect.profile().table_scoped_index_names
            && self
                .snapshot
                .tables
                .values()
                .any(|t| t.name != table.name && t.indexes.contains_key(name))
    }
}

/// Builds a snapshot from a statement sequence.
///
/// # Errors
///
/// See [`SchemaBuilder::apply`].
pub fn build(dialect: Dialect, statements: &[Statement]) -> Result<Snapshot> {
    let mut builder = SchemaBuilder::new(dialect);
    for statement in statements {
        builder.apply(statement)?;
    }
    Ok(builder.finish())
}

fn unknown_column(table: &Table, name: &str) -> Error {
    Error::unknown(EntityKind::Column, format!("{}.{name}", table.name))
}

fn rename_in(columns: &mut [String], from: &str, to: &str) {
    for column in columns {
        if column == from {
            *column = to.to_string();
        }
    }
}

fn base_name(table: &str) -> &str {
    table.rsplit_once('.').map_or(table, |(_, name)| name)
}

fn joined(columns: &[IndexColumn]) -> String {
    columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join("_")
}

/// Derives the name an engine gives an unnamed constraint.
fn implicit_name(table: &Table, kind: &ConstraintKind, column: Option<&str>) -> String {
    let base = base_name(&table.name);
    let stem = match kind {
        ConstraintKind::PrimaryKey { .. } => format!("{base}_pkey"),
        ConstraintKind::Unique { columns } => format!("{base}_{}_key", columns.join("_")),
        ConstraintKind::ForeignKey(fk) => format!("{base}_{}_fkey", fk.columns.join("_")),
        ConstraintKind::Check { .. } => match column {
            Some(column) => format!("{base}_{column}_check"),
            None => format!("{base}_check"),
        },
    };
    unique_name(&stem, |n| {
        table.constraints.contains_key(n) || table.indexes.contains_key(n)
    })
}

fn unique_name(stem: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(stem) {
        return stem.to_string();
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{stem}{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn snapshot(dialect: Dialect, sql: &str) -> Result<Snapshot> {
        let statements = Parser::new(sql, dialect).parse_statements()?;
        build(dialect, &statements)
    }

    fn sqlite(sql: &str) -> Snapshot {
        snapshot(Dialect::Sqlite, sql).unwrap()
    }

    #[test]
    fn test_create_table_columns_in_order() {
        let s = sqlite("CREATE TABLE users (id integer NOT NULL, name text, age integer);");
        let users = s.table("users").unwrap();
        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "age"]);
        assert!(!users.columns[0].nullable);
        assert!(users.columns[1].nullable);
        assert_eq!(users.columns[2].position, 2);
        assert!(users.source.is_some());
    }

    #[test]
    fn test_quoting_styles_build_the_same_table() {
        let a = sqlite("CREATE TABLE \"Users\" (\"ID\" integer);");
        let b = sqlite("CREATE TABLE `users` (`id` INT);");
        let c = sqlite("CREATE TABLE users (id Integer);");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_primary_key_implies_not_null() {
        let s = sqlite("CREATE TABLE t (a integer, b text, PRIMARY KEY (a));");
        let t = s.table("t").unwrap();
        assert!(!t.columns[0].nullable);
        assert_eq!(
            t.primary_key().map(|c| c.name.as_str()),
            Some("t_pkey")
        );
    }

    #[test]
    fn test_two_primary_keys_rejected() {
        let err = snapshot(
            Dialect::Sqlite,
            "CREATE TABLE t (a integer PRIMARY KEY, b integer PRIMARY KEY);",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_implicit_constraint_names() {
        let s = snapshot(
            Dialect::Postgres,
            "CREATE TABLE users (id integer PRIMARY KEY);\n\
             CREATE TABLE posts (\n\
               id integer PRIMARY KEY,\n\
               user_id integer REFERENCES users,\n\
               slug text UNIQUE,\n\
               score integer CHECK (score > 0),\n\
               CHECK (id > 0)\n\
             );",
        )
        .unwrap();
        let posts = s.table("posts").unwrap();
        let names: Vec<&str> = posts.constraints.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            [
                "posts_pkey",
                "posts_user_id_fkey",
                "posts_slug_key",
                "posts_score_check",
                "posts_check"
            ]
        );
        let (_, fk) = posts.foreign_keys().next().unwrap();
        assert_eq!(fk.ref_columns, ["id"]);
    }

    #[test]
    fn test_mysql_primary_key_is_named_primary() {
        let s = snapshot(
            Dialect::Mysql,
            "CREATE TABLE t (id int NOT NULL, PRIMARY KEY (id), KEY by_id (id));",
        )
        .unwrap();
        let t = s.table("t").unwrap();
        assert!(t.constraints.contains_key("PRIMARY"));
        assert!(t.indexes.contains_key("by_id"));
    }

    #[test]
    fn test_serial_and_nextval_agree() {
        let a = snapshot(Dialect::Postgres, "CREATE TABLE t (id serial PRIMARY KEY);").unwrap();
        let b = snapshot(
            Dialect::Postgres,
            "CREATE TABLE public.t (id integer DEFAULT nextval('t_id_seq'::regclass) NOT NULL, \
             CONSTRAINT t_pkey PRIMARY KEY (id));",
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_and_unknown_entities() {
        let dup = snapshot(Dialect::Sqlite, "CREATE TABLE t (a integer); CREATE TABLE T (b text);")
            .unwrap_err();
        assert!(matches!(
            dup,
            Error::DuplicateEntity {
                kind: EntityKind::Table,
                ..
            }
        ));

        let unknown = snapshot(Dialect::Sqlite, "DROP TABLE missing;").unwrap_err();
        assert!(matches!(
            unknown,
            Error::UnknownEntity {
                kind: EntityKind::Table,
                ..
            }
        ));

        assert!(snapshot(Dialect::Sqlite, "DROP TABLE IF EXISTS missing;").is_ok());
        assert!(snapshot(
            Dialect::Sqlite,
            "CREATE TABLE t (a integer); CREATE TABLE IF NOT EXISTS t (b text);"
        )
        .is_ok());
    }

    #[test]
    fn test_view_and_table_share_a_namespace() {
        let err = snapshot(
            Dialect::Sqlite,
            "CREATE TABLE t (a integer); CREATE VIEW t AS SELECT 1;",
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateEntity { .. }));
    }

    #[test]
    fn test_or_replace_view() {
        let s = snapshot(
            Dialect::Postgres,
            "CREATE TABLE t (a integer);\n\
             CREATE VIEW v AS SELECT a FROM t;\n\
             CREATE OR REPLACE VIEW v AS SELECT a + 1 FROM t;",
        )
        .unwrap();
        assert_eq!(s.views["v"].definition, "SELECT a + 1 FROM t");
        assert_eq!(s.views["v"].references, ["t"]);
    }

    #[test]
    fn test_alter_table_sequence() {
        let s = sqlite(
            "CREATE TABLE users (id integer, name text);\n\
             CREATE INDEX users_name ON users (name);\n\
             ALTER TABLE users ADD COLUMN age integer;\n\
             ALTER TABLE users DROP COLUMN name;\n\
             ALTER TABLE users RENAME COLUMN age TO years;",
        );
        let users = s.table("users").unwrap();
        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "years"]);
        assert!(users.indexes.is_empty());
        assert!(users.source.is_none());
    }

    #[test]
    fn test_rename_table_updates_references() {
        let s = snapshot(
            Dialect::Postgres,
            "CREATE TABLE a (id integer PRIMARY KEY);\n\
             CREATE TABLE b (a_id integer REFERENCES a (id));\n\
             CREATE INDEX a_id_idx ON a (id);\n\
             ALTER TABLE a RENAME TO c;\n\
             ALTER TABLE c RENAME COLUMN id TO key_id;",
        )
        .unwrap();
        assert_eq!(s.tables.get_index_of("c"), Some(0));
        assert_eq!(s.table("c").unwrap().indexes["a_id_idx"].table, "c");
        let (_, fk) = s.table("b").unwrap().foreign_keys().next().unwrap();
        assert_eq!(fk.ref_table, "c");
        assert_eq!(fk.ref_columns, ["key_id"]);
    }

    #[test]
    fn test_mysql_modify_and_positions() {
        let s = snapshot(
            Dialect::Mysql,
            "CREATE TABLE t (a int, b int);\n\
             ALTER TABLE t ADD COLUMN c int FIRST;\n\
             ALTER TABLE t MODIFY COLUMN a bigint NOT NULL AFTER b;",
        )
        .unwrap();
        let t = s.table("t").unwrap();
        let names: Vec<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["c", "b", "a"]);
        assert_eq!(t.columns[2].data_type, DataType::Bigint);
        assert!(!t.columns[2].nullable);
    }

    #[test]
    fn test_pass_through_statements_are_kept() {
        let s = sqlite(
            "CREATE TABLE t (a integer);\n\
             CREATE TRIGGER t_ai AFTER INSERT ON t BEGIN SELECT 1; END;",
        );
        assert_eq!(s.opaque.len(), 1);
    }

    #[test]
    fn test_index_on_unknown_table() {
        let err = snapshot(Dialect::Sqlite, "CREATE INDEX i ON missing (a);").unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownEntity {
                kind: EntityKind::Table,
                ..
            }
        ));
    }
}
