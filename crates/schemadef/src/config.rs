//! Table filter configuration.
//!
//! A config file is a JSON object:
//!
//! ```json
//! { "target_tables": ["users", "posts_.*"], "skip_tables": ["posts_archive"] }
//! ```
//!
//! Patterns are regular expressions matched against the whole canonical
//! table or view name.

use std::path::Path;

use regex::Regex;
use schemadef_core::Snapshot;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Contents of a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Only these tables are managed; all tables when absent.
    pub target_tables: Option<Vec<String>>,
    /// These tables are never managed.
    pub skip_tables: Vec<String>,
}

impl Config {
    /// Reads a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compiles the patterns.
    pub fn filter(&self) -> Result<TableFilter> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| Regex::new(&format!("^(?:{p})$")).map_err(Error::from))
                .collect()
        };
        Ok(TableFilter {
            targets: self.target_tables.as_deref().map(compile).transpose()?,
            skips: compile(&self.skip_tables)?,
        })
    }
}

/// Decides which tables and views a run manages.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    targets: Option<Vec<Regex>>,
    skips: Vec<Regex>,
}

impl TableFilter {
    /// Returns true if `name` is managed.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        let targeted = self
            .targets
            .as_ref()
            .map_or(true, |targets| targets.iter().any(|r| r.is_match(name)));
        targeted && !self.skips.iter().any(|r| r.is_match(name))
    }

    /// Removes unmanaged tables and views from a snapshot.
    pub fn apply(&self, snapshot: &mut Snapshot) {
        snapshot.retain_tables(|name| {
            let keep = self.accepts(name);
            if !keep {
                debug!(table = %name, "Table excluded by filter");
            }
            keep
        });
        snapshot.retain_views(|name| self.accepts(name));
    }
}
