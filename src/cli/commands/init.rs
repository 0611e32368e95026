//! `init` command: create the database named in the database config

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::config::load_database_settings;
use crate::database::Database;

/// Arguments for the `init` command
pub struct InitArgs {
    /// Path to the database configuration file
    pub database_config: PathBuf,
}

/// Handle the `init` command
pub fn handle_init(args: &InitArgs) -> Result<(), CliError> {
    let settings = load_database_settings(&args.database_config)?;
    let existed = settings.path().exists();

    let db = Database::create(&settings)?;

    if existed {
        println!("Database already exists at: {}", settings.name);
        let tables = db.list_tables()?;
        println!("Existing tables: {}", tables.len());
    } else {
        println!("Database created at: {}", settings.name);
    }
    println!("Type: {}", settings.kind);
    if let Some(description) = &settings.description {
        println!("Description: {}", description);
    }

    Ok(())
}
