//! Command-line administration entry point.
//!
//! # Responsibility
//! - Parse arguments and environment fallbacks.
//! - Initialize logging, open at most one connection and dispatch a command.
//! - Only `schema create` may create the database file.
//!
//! # Invariants
//! - The connection is owned here and dropped on every exit path.
//! - Any command error exits non-zero.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use partyapp_core::{default_log_level, init_logging, DEFAULT_VIEW_LIMIT};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod commands;
mod output;

#[derive(Parser, Debug)]
#[command(name = "partyapp", version, about = "Party and law registry administration")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "PARTYAPP_DATABASE", default_value = "partyapp.db")]
    database: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "PARTYAPP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write rotating log files here instead of stderr
    #[arg(long, global = true, env = "PARTYAPP_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, drop or inspect the schema
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },

    /// Test the database connection
    Ping,

    /// List entity types and whether their tables exist
    Models,

    /// Show the column schema of one entity type
    Describe {
        /// Entity name (e.g. Party) or table name (e.g. M_PARTY)
        entity: String,
    },

    /// Load `<Entity>.csv` files from a directory
    Seed {
        /// Directory holding the seed files
        #[arg(long)]
        dir: PathBuf,

        /// Validate and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show records of one entity type
    View {
        /// Entity name (e.g. Party) or table name (e.g. M_PARTY)
        entity: String,

        /// Maximum rows to return
        #[arg(short = 'n', long, default_value_t = DEFAULT_VIEW_LIMIT)]
        limit: u32,

        /// Comma-separated columns to show
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Column to order by
        #[arg(long)]
        order_by: Option<String>,

        /// Order descending
        #[arg(long)]
        desc: bool,

        /// Equality filter, repeatable; empty value matches NULL
        #[arg(long = "where", value_name = "COLUMN=VALUE")]
        filters: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum SchemaAction {
    /// Create all tables (idempotent)
    Create,
    /// Drop all tables
    Drop,
    /// Show schema version and table presence
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(&cli) {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=command module=cli status=error error={err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let log_dir = cli
        .log_dir
        .as_deref()
        .map(absolute_path)
        .transpose()?
        .map(|dir| dir.to_string_lossy().into_owned());
    init_logging(level, log_dir.as_deref()).map_err(anyhow::Error::msg)
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

fn run(cli: Cli) -> Result<()> {
    let database = cli.database;
    match cli.command {
        Commands::Schema { action } => match action {
            SchemaAction::Create => commands::schema_create(&mut create_db(&database)?),
            SchemaAction::Drop => commands::schema_drop(&mut existing_db(&database)?),
            SchemaAction::Status => commands::schema_status(&existing_db(&database)?),
        },
        Commands::Ping => commands::ping(&existing_db(&database)?, &database),
        Commands::Models => commands::models(&existing_db(&database)?),
        Commands::Describe { entity } => commands::describe(&entity),
        Commands::Seed { dir, dry_run } => {
            commands::seed(&mut existing_db(&database)?, &dir, dry_run)
        }
        Commands::View {
            entity,
            limit,
            columns,
            order_by,
            desc,
            filters,
            format,
        } => {
            let query = partyapp_core::ViewQuery {
                entity,
                columns,
                filters,
                order_by,
                descending: desc,
                limit,
            };
            // Rejected requests never touch the database file.
            let plan = partyapp_core::plan_view(&query)?;
            commands::view(&existing_db(&database)?, &plan, format == OutputFormat::Json)
        }
    }
}

fn create_db(path: &Path) -> Result<Connection> {
    partyapp_core::open_db(path)
        .with_context(|| format!("failed to open database {}", path.display()))
}

fn existing_db(path: &Path) -> Result<Connection> {
    partyapp_core::open_existing_db(path).with_context(|| {
        format!(
            "failed to open database {}; run `schema create` first",
            path.display()
        )
    })
}
