//! `tables` command: list user tables with row counts

use std::path::PathBuf;

use super::open_configured_database;
use crate::cli::error::CliError;
use crate::cli::output::format_table_list;

/// Arguments for the `tables` command
pub struct TablesArgs {
    /// Path to the database configuration file
    pub database_config: PathBuf,
}

/// Handle the `tables` command
pub fn handle_tables(args: &TablesArgs) -> Result<(), CliError> {
    let db = open_configured_database(&args.database_config)?;
    let tables = db.list_tables()?;
    print!("{}", format_table_list(&tables));
    Ok(())
}
