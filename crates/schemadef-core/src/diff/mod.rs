//! Schema diffing.
//!
//! Compares a current and a desired [`Snapshot`] and produces the ordered
//! list of [`Operation`]s that turns one into the other. Operations come out
//! in phases so that every statement only relies on what earlier ones built:
//!
//! 1. views that go away or change are dropped, dependents first;
//! 2. foreign keys that go away are dropped from kept tables;
//! 3. tables are dropped, referencing tables first, then the other keys
//!    and indexes kept tables lose;
//! 4. columns of kept tables are dropped, added and modified;
//! 5. kept tables gain their new indexes and keys;
//! 6. tables are created, referenced tables first;
//! 7. foreign keys are added;
//! 8. views are created, dependencies first.
//!
//! Keys of kept tables exist before new tables reference them, and foreign
//! keys come after every table and key they point to.

mod order;

use std::collections::HashSet;

use tracing::debug;

use crate::dialect::{ColumnOrderPolicy, Dialect, ModifyStrategy};
use crate::error::{Error, Result};
use crate::lexer::{Lexer, TokenKind};
use crate::schema::{Column, Constraint, ConstraintKind, Index, Snapshot, Table, View};

use order::DependencyGraph;

/// Where an added or moved column goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// First column of the table.
    First,
    /// Right after the named column.
    After(String),
}

/// One structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create a table with its columns and constraints.
    CreateTable {
        /// The table as desired.
        table: Table,
    },
    /// Drop a table.
    DropTable {
        /// Table name.
        name: String,
    },
    /// Add a column to an existing table.
    AddColumn {
        /// Table name.
        table: String,
        /// New column.
        column: Column,
        /// Explicit placement, for position-sensitive dialects.
        position: Option<Placement>,
        /// Constraints declared with the column, for dialects that cannot
        /// add them to an existing table on their own.
        constraints: Vec<Constraint>,
    },
    /// Drop a column.
    DropColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
    /// Change a column's definition or position.
    ModifyColumn {
        /// Table name.
        table: String,
        /// Current definition.
        from: Column,
        /// Desired definition.
        to: Column,
        /// Explicit placement when the column moves.
        position: Option<Placement>,
    },
    /// Create an index.
    AddIndex {
        /// The index as desired.
        index: Index,
    },
    /// Drop an index.
    DropIndex {
        /// The index as it currently exists.
        index: Index,
    },
    /// Add a constraint to an existing table.
    AddConstraint {
        /// Table name.
        table: String,
        /// The constraint.
        constraint: Constraint,
    },
    /// Drop a constraint.
    DropConstraint {
        /// Table name.
        table: String,
        /// The constraint as it currently exists.
        constraint: Constraint,
    },
    /// Create a view.
    CreateView {
        /// The view as desired.
        view: View,
    },
    /// Drop a view.
    DropView {
        /// View name.
        name: String,
    },
}

impl Operation {
    /// Returns true for DROP-class operations.
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::DropTable { .. }
                | Self::DropColumn { .. }
                | Self::DropIndex { .. }
                | Self::DropConstraint { .. }
                | Self::DropView { .. }
        )
    }
}

/// Per-table changes of a table present in both snapshots.
#[derive(Debug, Default)]
struct TableDiff {
    name: String,
    drop_constraints: Vec<Operation>,
    drop_indexes: Vec<Operation>,
    columns: Vec<Operation>,
    add_indexes: Vec<Operation>,
    add_constraints: Vec<Operation>,
    add_foreign_keys: Vec<Operation>,
    /// A column was dropped or redefined, so views reading the table must be
    /// rebuilt.
    columns_changed: bool,
}

/// Computes operations between snapshots for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Differ {
    dialect: Dialect,
}

impl Differ {
    /// Creates a differ.
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Compares two snapshots and returns the operations that transform
    /// `current` into `desired`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if either snapshot references a
    /// missing table or column.
    pub fn diff(&self, current: &Snapshot, desired: &Snapshot) -> Result<Vec<Operation>> {
        validate(current)?;
        validate(desired)?;

        let profile = self.dialect.profile();
        let tables: Vec<TableDiff> = desired
            .tables
            .values()
            .filter_map(|to| {
                current
                    .tables
                    .get(&to.name)
                    .map(|from| self.diff_table(from, to))
            })
            .collect();

        let dropped_tables: Vec<&Table> = current
            .tables
            .values()
            .filter(|t| !desired.tables.contains_key(&t.name))
            .collect();
        let created_tables: Vec<&Table> = desired
            .tables
            .values()
            .filter(|t| !current.tables.contains_key(&t.name))
            .collect();

        let mut operations = Vec::new();

        // ============================================================
        // Views going away
        // ============================================================
        let (dropped_views, created_views) =
            view_changes(current, desired, &tables, &dropped_tables);
        operations.extend(
            dropped_views
                .into_iter()
                .map(|name| Operation::DropView { name }),
        );

        // ============================================================
        // Foreign keys and tables going away
        // ============================================================
        let (dropped_foreign_keys, dropped_keys): (Vec<&Operation>, Vec<&Operation>) = tables
            .iter()
            .flat_map(|diff| &diff.drop_constraints)
            .partition(|op| match op {
                Operation::DropConstraint { constraint, .. } => constraint.kind.is_foreign_key(),
                _ => false,
            });
        operations.extend(dropped_foreign_keys.into_iter().cloned());

        let mut graph = DependencyGraph::new(dropped_tables.iter().map(|t| t.name.as_str()));
        for table in &dropped_tables {
            for (_, fk) in table.foreign_keys() {
                // Referencing tables are dropped first.
                graph.add_dependency(&fk.ref_table, &table.name);
            }
        }
        let drop_order = graph.order();
        if !drop_order.forced.is_empty() && !profile.deferred_foreign_keys {
            debug!(tables = ?drop_order.forced, "breaking foreign key cycle before drop");
            for table in &dropped_tables {
                let position = drop_order.position(&table.name);
                for (constraint, fk) in table.foreign_keys() {
                    let earlier = match (drop_order.position(&fk.ref_table), position) {
                        (Some(target), Some(own)) => target < own,
                        _ => false,
                    };
                    if fk.ref_table != table.name && earlier {
                        operations.push(Operation::DropConstraint {
                            table: table.name.clone(),
                            constraint: constraint.clone(),
                        });
                    }
                }
            }
        }
        operations.extend(
            drop_order
                .order
                .into_iter()
                .map(|name| Operation::DropTable { name }),
        );
        operations.extend(dropped_keys.into_iter().cloned());
        for diff in &tables {
            operations.extend(diff.drop_indexes.iter().cloned());
        }

        // ============================================================
        // Columns, indexes and keys of kept tables
        // ============================================================
        for diff in &tables {
            operations.extend(diff.columns.iter().cloned());
        }
        for diff in &tables {
            operations.extend(diff.add_indexes.iter().cloned());
            operations.extend(diff.add_constraints.iter().cloned());
        }

        // ============================================================
        // New tables
        // ============================================================
        let mut graph = DependencyGraph::new(created_tables.iter().map(|t| t.name.as_str()));
        for table in &created_tables {
            for (_, fk) in table.foreign_keys() {
                graph.add_dependency(&table.name, &fk.ref_table);
            }
        }
        let create_order = graph.order();
        let defer_cycles = !create_order.forced.is_empty() && !profile.deferred_foreign_keys;
        if !create_order.forced.is_empty() && profile.deferred_foreign_keys {
            debug!(
                tables = ?create_order.forced,
                "mutually referencing tables created in declaration order"
            );
        }

        let mut deferred_foreign_keys = Vec::new();
        for name in &create_order.order {
            let Some(desired_table) = desired.tables.get(name) else {
                continue;
            };
            let mut table = desired_table.clone();
            if defer_cycles {
                let position = create_order.position(name);
                let late: Vec<String> = table
                    .foreign_keys()
                    .filter(|(_, fk)| {
                        matches!(
                            (create_order.position(&fk.ref_table), position),
                            (Some(target), Some(own)) if target > own
                        )
                    })
                    .map(|(constraint, _)| constraint.name.clone())
                    .collect();
                if !late.is_empty() {
                    debug!(table = %name, constraints = ?late, "deferring foreign keys of cyclic table");
                    table.source = None;
                }
                for constraint in late {
                    if let Some(constraint) = table.constraints.shift_remove(&constraint) {
                        deferred_foreign_keys.push(Operation::AddConstraint {
                            table: name.clone(),
                            constraint,
                        });
                    }
                }
            }
            // Indexes declared inside CREATE TABLE come with the table text.
            let indexes: Vec<Operation> = table
                .indexes
                .values()
                .filter(|index| table.source.is_none() || index.source.is_some())
                .map(|index| Operation::AddIndex {
                    index: index.clone(),
                })
                .collect();
            operations.push(Operation::CreateTable { table });
            operations.extend(indexes);
        }

        // ============================================================
        // Foreign keys
        // ============================================================
        operations.extend(deferred_foreign_keys);
        for diff in &tables {
            operations.extend(diff.add_foreign_keys.iter().cloned());
        }

        // ============================================================
        // New views
        // ============================================================
        operations.extend(
            created_views
                .into_iter()
                .filter_map(|name| desired.views.get(&name).cloned())
                .map(|view| Operation::CreateView { view }),
        );

        debug!(
            dialect = %self.dialect,
            operations = operations.len(),
            "computed schema diff"
        );
        Ok(operations)
    }

    fn diff_table(&self, from: &Table, to: &Table) -> TableDiff {
        let profile = self.dialect.profile();
        let mut diff = TableDiff {
            name: to.name.clone(),
            ..TableDiff::default()
        };

        for column in &from.columns {
            if to.column(&column.name).is_none() {
                diff.columns.push(Operation::DropColumn {
                    table: to.name.clone(),
                    column: column.name.clone(),
                });
                diff.columns_changed = true;
            }
        }

        // Columns re-created with DROP + ADD.
        let mut recreated: HashSet<&str> = HashSet::new();
        if profile.modify_strategy == ModifyStrategy::DropAndAdd {
            for column in &to.columns {
                let changed = from
                    .column(&column.name)
                    .is_some_and(|old| !old.same_definition(column));
                if changed {
                    debug!(table = %to.name, column = %column.name, "re-creating changed column");
                    diff.columns.push(Operation::DropColumn {
                        table: to.name.clone(),
                        column: column.name.clone(),
                    });
                    recreated.insert(column.name.as_str());
                    diff.columns_changed = true;
                }
            }
        }

        let reposition = profile.column_order == ColumnOrderPolicy::Reposition;
        // Column order as the generated statements leave it.
        let mut order: Vec<&str> = from
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| to.column(name).is_some() && !recreated.contains(name))
            .collect();

        for (i, column) in to.columns.iter().enumerate() {
            let placement = if i == 0 {
                Placement::First
            } else {
                Placement::After(to.columns[i - 1].name.clone())
            };

            match from.column(&column.name) {
                Some(old) if !recreated.contains(column.name.as_str()) => {
                    let moved = reposition && order.get(i) != Some(&column.name.as_str());
                    if moved {
                        order.retain(|name| *name != column.name);
                        order.insert(i.min(order.len()), column.name.as_str());
                    }
                    if moved || !old.same_definition(column) {
                        diff.columns.push(Operation::ModifyColumn {
                            table: to.name.clone(),
                            from: old.clone(),
                            to: column.clone(),
                            position: moved.then_some(placement),
                        });
                        diff.columns_changed = true;
                    }
                }
                _ => {
                    if reposition {
                        order.insert(i.min(order.len()), column.name.as_str());
                    }
                    diff.columns.push(Operation::AddColumn {
                        table: to.name.clone(),
                        column: column.clone(),
                        position: reposition.then_some(placement),
                        constraints: Vec::new(),
                    });
                }
            }
        }

        let touches_recreated =
            |columns: &[String]| columns.iter().any(|c| recreated.contains(c.as_str()));

        for (name, index) in &from.indexes {
            let names: Vec<String> = index.columns.iter().map(|c| c.name.clone()).collect();
            let keep = to.indexes.get(name) == Some(index) && !touches_recreated(&names);
            if !keep {
                diff.drop_indexes.push(Operation::DropIndex {
                    index: index.clone(),
                });
            }
        }
        for (name, index) in &to.indexes {
            let names: Vec<String> = index.columns.iter().map(|c| c.name.clone()).collect();
            let keep = from.indexes.get(name) == Some(index) && !touches_recreated(&names);
            if !keep {
                diff.add_indexes.push(Operation::AddIndex {
                    index: index.clone(),
                });
            }
        }

        let mut dropped_foreign_keys = Vec::new();
        let mut dropped_others = Vec::new();
        for (name, constraint) in &from.constraints {
            let keep = to.constraints.get(name) == Some(constraint)
                && !touches_recreated(constraint.kind.columns());
            if !keep {
                let operation = Operation::DropConstraint {
                    table: to.name.clone(),
                    constraint: constraint.clone(),
                };
                if constraint.kind.is_foreign_key() {
                    dropped_foreign_keys.push(operation);
                } else {
                    dropped_others.push(operation);
                }
            }
        }
        diff.drop_constraints = dropped_foreign_keys;
        diff.drop_constraints.extend(dropped_others);

        let added: Vec<String> = diff
            .columns
            .iter()
            .filter_map(|op| match op {
                Operation::AddColumn { column, .. } => Some(column.name.clone()),
                _ => None,
            })
            .collect();
        let mut inlined: Vec<(String, Constraint)> = Vec::new();

        for (name, constraint) in &to.constraints {
            let keep = from.constraints.get(name) == Some(constraint)
                && !touches_recreated(constraint.kind.columns());
            if !keep {
                if !profile.alter_constraints {
                    if let Some(column) = inline_column(&constraint.kind, &added) {
                        debug!(table = %to.name, column = %column, constraint = %name, "declaring constraint with its column");
                        inlined.push((column, constraint.clone()));
                        continue;
                    }
                }
                let operation = Operation::AddConstraint {
                    table: to.name.clone(),
                    constraint: constraint.clone(),
                };
                if constraint.kind.is_foreign_key() {
                    diff.add_foreign_keys.push(operation);
                } else {
                    diff.add_constraints.push(operation);
                }
            }
        }

        for op in &mut diff.columns {
            if let Operation::AddColumn {
                column,
                constraints,
                ..
            } = op
            {
                constraints.extend(
                    inlined
                        .iter()
                        .filter(|(owner, _)| *owner == column.name)
                        .map(|(_, constraint)| constraint.clone()),
                );
            }
        }

        diff
    }
}

/// The added column a constraint can be declared with: the column of a
/// single-column foreign key, or the last added column a check reads.
fn inline_column(kind: &ConstraintKind, added: &[String]) -> Option<String> {
    match kind {
        ConstraintKind::ForeignKey(fk) => match fk.columns.as_slice() {
            [column] if added.contains(column) => Some(column.clone()),
            _ => None,
        },
        ConstraintKind::Check { expression } => {
            let read = expression_columns(expression);
            added
                .iter()
                .rev()
                .find(|c| read.iter().any(|r| r.eq_ignore_ascii_case(c)))
                .cloned()
        }
        ConstraintKind::PrimaryKey { .. } | ConstraintKind::Unique { .. } => None,
    }
}

/// Identifiers appearing in a normalized expression.
fn expression_columns(expression: &str) -> Vec<String> {
    Lexer::new(expression)
        .tokenize()
        .into_iter()
        .filter_map(|token| match token.kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Compares two snapshots for `dialect`.
///
/// # Errors
///
/// See [`Differ::diff`].
pub fn diff(dialect: Dialect, current: &Snapshot, desired: &Snapshot) -> Result<Vec<Operation>> {
    Differ::new(dialect).diff(current, desired)
}

/// Decides which views to drop and which to create, each in execution order.
///
/// A view is dropped when it disappears, when its definition changes, when a
/// table it reads loses or redefines a column, and when a view it reads is
/// dropped. Dropped views that are still desired are created again.
fn view_changes(
    current: &Snapshot,
    desired: &Snapshot,
    tables: &[TableDiff],
    dropped_tables: &[&Table],
) -> (Vec<String>, Vec<String>) {
    let affected: HashSet<&str> = tables
        .iter()
        .filter(|d| d.columns_changed)
        .map(|d| d.name.as_str())
        .chain(dropped_tables.iter().map(|t| t.name.as_str()))
        .collect();

    let mut dropped: HashSet<String> = current
        .views
        .values()
        .filter(|view| match desired.views.get(&view.name) {
            None => true,
            Some(new) => {
                new != *view
                    || view
                        .references
                        .iter()
                        .any(|r| affected.contains(r.as_str()))
            }
        })
        .map(|view| view.name.clone())
        .collect();

    loop {
        let before = dropped.len();
        for view in current.views.values() {
            if !dropped.contains(&view.name) && view.references.iter().any(|r| dropped.contains(r))
            {
                dropped.insert(view.name.clone());
            }
        }
        if dropped.len() == before {
            break;
        }
    }

    let mut graph = DependencyGraph::new(
        current
            .views
            .keys()
            .filter(|name| dropped.contains(*name))
            .map(String::as_str),
    );
    for view in current.views.values() {
        for reference in &view.references {
            // Dependents are dropped before what they read.
            graph.add_dependency(reference, &view.name);
        }
    }
    let drop_order = graph.order().order;

    let created: Vec<&View> = desired
        .views
        .values()
        .filter(|view| !current.views.contains_key(&view.name) || dropped.contains(&view.name))
        .collect();
    let mut graph = DependencyGraph::new(created.iter().map(|v| v.name.as_str()));
    for view in &created {
        for reference in &view.references {
            graph.add_dependency(&view.name, reference);
        }
    }
    let create_order = graph.order().order;

    (drop_order, create_order)
}

/// Checks that every constraint and index refers to existing tables and
/// columns.
fn validate(snapshot: &Snapshot) -> Result<()> {
    for table in snapshot.tables.values() {
        for constraint in table.constraints.values() {
            for column in constraint.kind.columns() {
                if table.column(column).is_none() {
                    return Err(Error::InvalidSchema(format!(
                        "constraint {} on table {} references missing column {column}",
                        constraint.name, table.name
                    )));
                }
            }

            let ConstraintKind::ForeignKey(fk) = &constraint.kind else {
                continue;
            };
            let Some(target) = snapshot.table(&fk.ref_table) else {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {} on table {} references missing table {}",
                    constraint.name, table.name, fk.ref_table
                )));
            };
            if fk.ref_columns.len() != fk.columns.len() {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {} on table {} has {} columns but references {}",
                    constraint.name,
                    table.name,
                    fk.columns.len(),
                    fk.ref_columns.len()
                )));
            }
            if let Some(missing) = fk.ref_columns.iter().find(|c| target.column(c).is_none()) {
                return Err(Error::InvalidSchema(format!(
                    "foreign key {} on table {} references missing column {}.{missing}",
                    constraint.name, table.name, fk.ref_table
                )));
            }
        }

        for index in table.indexes.values() {
            if index.table != table.name {
                return Err(Error::InvalidSchema(format!(
                    "index {} is owned by table {} but names table {}",
                    index.name, table.name, index.table
                )));
            }
            if let Some(missing) = index.columns.iter().find(|c| table.column(&c.name).is_none()) {
                return Err(Error::InvalidSchema(format!(
                    "index {} on table {} references missing column {}",
                    index.name, table.name, missing.name
                )));
            }
        }
    }
    Ok(())
}
