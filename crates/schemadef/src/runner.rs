//! Runs: dump the database, compare with the desired schema, report and
//! apply the difference.

use schemadef_core::generate::{self, GenerateOptions, Plan};
use schemadef_core::{parse_schema, Snapshot};
use tracing::info;

use crate::adapter::DatabaseAdapter;
use crate::config::TableFilter;
use crate::error::Result;

/// Transcript header of a run that executes statements.
pub const APPLY_HEADER: &str = "-- Apply --";
/// Transcript header of a run that only shows statements.
pub const DRY_RUN_HEADER: &str = "-- dry run --";
/// Transcript of a run with nothing to do.
pub const NOTHING_MODIFIED: &str = "-- Nothing is modified --";
/// Transcript of a run against a database without tables.
pub const NO_TABLE_EXISTS: &str = "-- No table exists --";

/// Compares a database with desired DDL and applies the difference.
#[derive(Debug)]
pub struct Runner<A: DatabaseAdapter> {
    adapter: A,
    filter: TableFilter,
    options: GenerateOptions,
}

impl<A: DatabaseAdapter> Runner<A> {
    /// Creates a runner managing every table.
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            filter: TableFilter::default(),
            options: GenerateOptions::default(),
        }
    }

    /// Restricts the run to the tables accepted by `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets generation options.
    #[must_use]
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the adapter.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Dumps the database and computes what `desired` requires.
    pub async fn plan(&self, desired: &str) -> Result<Plan> {
        let dialect = self.adapter.dialect();
        let dump = self.adapter.dump().await?;
        let current = self.snapshot(&dump)?;
        let desired = self.snapshot(desired)?;
        Ok(generate::plan(dialect, &current, &desired, &self.options)?)
    }

    /// Executes the runnable statements of a plan.
    pub async fn execute(&self, plan: &Plan) -> Result<()> {
        let statements: Vec<String> = plan.executable().map(str::to_string).collect();
        if statements.is_empty() {
            return Ok(());
        }
        info!(statements = statements.len(), "Applying schema changes");
        self.adapter.apply(&statements).await
    }

    /// Plans, applies unless `dry_run`, and returns the transcript.
    pub async fn run(&self, desired: &str, dry_run: bool) -> Result<String> {
        let plan = self.plan(desired).await?;
        if !dry_run {
            self.execute(&plan).await?;
        }
        Ok(transcript(&plan, dry_run))
    }

    /// Returns the current schema as DDL text.
    pub async fn export(&self) -> Result<String> {
        let dump = self.adapter.dump().await?;
        if self.snapshot(&dump)?.has_no_tables() {
            return Ok(format!("{NO_TABLE_EXISTS}\n"));
        }
        Ok(dump)
    }

    fn snapshot(&self, sql: &str) -> Result<Snapshot> {
        let mut snapshot = parse_schema(self.adapter.dialect(), sql)?;
        self.filter.apply(&mut snapshot);
        Ok(snapshot)
    }
}

/// Renders the report of a plan: a header followed by one statement per
/// line, or a single status line.
#[must_use]
pub fn transcript(plan: &Plan, dry_run: bool) -> String {
    match plan {
        Plan::Apply(ddls) => {
            let header = if dry_run { DRY_RUN_HEADER } else { APPLY_HEADER };
            let mut out = format!("{header}\n");
            for ddl in ddls {
                out.push_str(&ddl.to_string());
                out.push('\n');
            }
            out
        }
        Plan::NothingModified => format!("{NOTHING_MODIFIED}\n"),
        Plan::NoTableExists => format!("{NO_TABLE_EXISTS}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemadef_core::Ddl;

    #[test]
    fn test_transcript() {
        let plan = Plan::Apply(vec![
            Ddl {
                sql: "DROP TABLE `a`".into(),
                skipped: true,
            },
            Ddl {
                sql: "CREATE TABLE b (id integer)".into(),
                skipped: false,
            },
        ]);
        assert_eq!(
            transcript(&plan, false),
            "-- Apply --\n-- Skipped: DROP TABLE `a`;\nCREATE TABLE b (id integer);\n"
        );
        assert!(transcript(&plan, true).starts_with("-- dry run --\n"));
        assert_eq!(
            transcript(&Plan::NothingModified, false),
            "-- Nothing is modified --\n"
        );
        assert_eq!(
            transcript(&Plan::NoTableExists, true),
            "-- No table exists --\n"
        );
    }
}
