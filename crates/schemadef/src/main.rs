//! schemadef CLI
//!
//! Brings a SQLite database in line with a DDL file.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use schemadef::config::Config;
use schemadef::runner::Runner;
use schemadef::SqliteAdapter;
use schemadef_core::GenerateOptions;

/// Idempotent schema management for SQLite.
#[derive(Parser)]
#[command(name = "schemadef")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file.
    #[arg(env = "SCHEMADEF_DATABASE")]
    database: PathBuf,

    /// Desired schema file; read from stdin when absent.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Show the statements without executing them.
    #[arg(long)]
    dry_run: bool,

    /// Never drop tables, columns, indexes, constraints or views.
    #[arg(long)]
    skip_drop: bool,

    /// Print the current schema and exit.
    #[arg(long)]
    export: bool,

    /// JSON file selecting the tables to manage.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the transcript only.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let adapter = SqliteAdapter::connect(&cli.database).await?;
    let runner = Runner::new(adapter)
        .with_filter(config.filter()?)
        .with_options(GenerateOptions {
            skip_drop: cli.skip_drop,
        });

    if cli.export {
        print!("{}", runner.export().await?);
        return Ok(());
    }

    let desired = match &cli.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    debug!(bytes = desired.len(), "Read desired schema");

    // Printed once applied, so a failed run reports only its error.
    print!("{}", runner.run(&desired, cli.dry_run).await?);

    Ok(())
}
