//! tablesync CLI
//!
//! Command-line tool for inspecting what a lifecycle event would do to a table.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use tablesync::prelude::*;

/// Declarative Redshift table reconciliation.
#[derive(Parser)]
#[command(name = "tablesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, env = "TABLESYNC_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statements a lifecycle event would run, without running them.
    Plan {
        /// Path to the lifecycle event JSON.
        #[arg(short, long, env = "TABLESYNC_EVENT")]
        event: PathBuf,
    },

    /// Compare two table property documents.
    Diff {
        /// Previously applied table properties (JSON).
        #[arg(long)]
        old: PathBuf,

        /// Newly declared table properties (JSON).
        #[arg(long)]
        new: PathBuf,

        /// Physical name of the existing table (defaults to the old prefix).
        #[arg(short, long)]
        table: Option<String>,

        /// Request id used to name a replacement table.
        #[arg(short, long, default_value = "")]
        request_id: String,
    },
}

fn load_schema(path: &Path) -> anyhow::Result<TableSchema> {
    let json = std::fs::read_to_string(path)?;
    Ok(TableProperties::from_json(&json)?.into_schema())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Plan { event } => {
            let event = LifecycleEvent::load(&event)?;
            info!(kind = %event.kind, request_id = %event.request_id, "Planning event");

            let dispatcher = Dispatcher::new(DryRunExecutor::new());
            let response = dispatcher.handle(&event).await?;
            println!("{}", serde_json::to_string(&response)?);
        }

        Commands::Diff {
            old,
            new,
            table,
            request_id,
        } => {
            let old = load_schema(&old)?;
            let new = load_schema(&new)?;
            let table = table.unwrap_or_else(|| old.table_name.prefix.clone());

            let event = LifecycleEvent::update(request_id, table, old, new);
            let plan = Dispatcher::new(DryRunExecutor::new()).plan(&event)?;
            match &plan {
                Plan::Replace {
                    name,
                    previous,
                    reason,
                    ..
                } => {
                    println!("-- replace {} with {}: {}", previous, name, reason);
                }
                Plan::Alter { statements, .. } if statements.is_empty() => {
                    println!("-- no changes");
                }
                _ => {}
            }
            for sql in plan.statements() {
                println!("{};", sql);
            }
        }
    }

    Ok(())
}
