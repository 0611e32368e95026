//! `import` command: load one CSV file into a table

use std::path::PathBuf;

use super::open_configured_database;
use crate::cli::error::CliError;
use crate::cli::output::format_import_report;
use crate::config::{ImportSettings, OnTableExists, load_import_settings};
use crate::database::Database;
use crate::error::ImportError;
use crate::pipeline::{ImportOutcome, import_csv};

/// Number of table rows shown after a successful import
const PREVIEW_ROWS: usize = 5;

/// Arguments for the `import` command
pub struct ImportArgs {
    /// Path to the database configuration file
    pub database_config: PathBuf,
    /// Path to the import configuration file
    pub config: PathBuf,
    /// Override the CSV file to import
    pub source: Option<PathBuf>,
    /// Override the target table
    pub table: Option<String>,
    /// Override the existing-table policy
    pub on_exists: Option<OnTableExists>,
    /// Print the outcome as JSON
    pub json: bool,
}

/// Build settings from the config file and command-line overrides
///
/// The config file may be absent when both `--source` and `--table` are given.
pub fn resolve_settings(args: &ImportArgs) -> Result<ImportSettings, ImportError> {
    let mut settings = match (&args.source, &args.table) {
        (Some(source), Some(table)) if !args.config.exists() => {
            ImportSettings::new(source.clone(), table.clone())
        }
        _ => load_import_settings(&args.config)?,
    };

    if let Some(source) = &args.source {
        settings.source_path = source.clone();
    }
    if let Some(table) = &args.table {
        settings.target_table = table.clone();
    }
    if let Some(policy) = args.on_exists {
        settings.on_table_exists = policy;
    }

    settings.validate().map_err(ImportError::InvalidConfig)?;
    Ok(settings)
}

/// Handle the `import` command
pub fn handle_import(args: &ImportArgs) -> Result<(), CliError> {
    let result = resolve_settings(args).and_then(|settings| {
        let mut db = open_configured_database(&args.database_config)?;
        let report = import_csv(&mut db, &settings)?;
        let (columns, preview) = table_preview(&db, &report.table);
        Ok((report, columns, preview))
    });

    if args.json {
        let outcome = ImportOutcome::from_result(result.map(|(report, _, _)| report));
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return if outcome.is_success() {
            Ok(())
        } else {
            Err(CliError::Reported)
        };
    }

    let (report, columns, preview) = result?;
    print!("{}", format_import_report(&report, &columns, &preview));
    Ok(())
}

/// Column names and last rows of `table`, empty when the lookup fails
///
/// Runs after the import committed, so errors are logged and not returned.
fn table_preview(db: &Database, table: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let preview = db.table_columns(table).and_then(|columns| {
        let rows = db.tail_rows(table, PREVIEW_ROWS)?;
        Ok((columns.into_iter().map(|c| c.name).collect(), rows))
    });
    preview.unwrap_or_else(|err| {
        tracing::warn!("Could not load preview of {}: {}", table, err);
        (Vec::new(), Vec::new())
    })
}
