//! DDL parser.
//!
//! A hand-written recursive descent parser for the subset of DDL a schema
//! file or a database dump contains. Expressions that only need to be
//! compared (defaults, CHECK bodies, view queries) are captured as token
//! fragments instead of being parsed into trees.

mod error;
mod parser;

pub use error::ParseError;
pub use parser::Parser;
