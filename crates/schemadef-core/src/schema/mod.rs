//! Normalized schema model and the builder that produces it.

mod builder;
mod model;

pub use builder::{build, SchemaBuilder};
pub use model::{
    Column, Constraint, ConstraintKind, ForeignKey, Index, IndexColumn, Snapshot, Table, View,
};
