//! table-importer binary

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use table_importer::OnTableExists;
use table_importer::cli::CliError;
use table_importer::cli::commands::{
    ImportArgs, InitArgs, PromoteArgs, TablesArgs, handle_import, handle_init, handle_promote,
    handle_tables,
};

#[derive(Parser, Debug)]
#[command(
    name = "table-importer",
    version,
    about = "Import CSV files into an embedded DuckDB database"
)]
struct Cli {
    /// Database configuration file
    #[arg(long, global = true, default_value = "database_config.json")]
    database_config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database (idempotent)
    Init,
    /// Import a CSV file into a table
    Import {
        /// Import configuration file
        #[arg(long, default_value = "csv_import_config.json")]
        config: PathBuf,
        /// CSV file to import (overrides the config)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Target table (overrides the config)
        #[arg(long)]
        table: Option<String>,
        /// What to do when the table exists: append, replace, fail
        #[arg(long)]
        on_exists: Option<OnTableExists>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tables and row counts
    Tables,
    /// Copy raw* tables into de-duplicated stg* tables
    Promote {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let database_config = cli.database_config;
    match cli.command {
        Commands::Init => handle_init(&InitArgs { database_config }),
        Commands::Import {
            config,
            source,
            table,
            on_exists,
            json,
        } => handle_import(&ImportArgs {
            database_config,
            config,
            source,
            table,
            on_exists,
            json,
        }),
        Commands::Tables => handle_tables(&TablesArgs { database_config }),
        Commands::Promote { json } => handle_promote(&PromoteArgs {
            database_config,
            json,
        }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Reported) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}
