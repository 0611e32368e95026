//! CLI command handlers

pub mod import;
pub mod init;
pub mod promote;
pub mod tables;

pub use import::{ImportArgs, handle_import};
pub use init::{InitArgs, handle_init};
pub use promote::{PromoteArgs, handle_promote};
pub use tables::{TablesArgs, handle_tables};

use std::path::Path;

use crate::config::load_database_settings;
use crate::database::Database;
use crate::error::ImportError;

/// Open the database named in the database config; it must already exist
pub(crate) fn open_configured_database(database_config: &Path) -> Result<Database, ImportError> {
    let settings = load_database_settings(database_config)?;
    Database::open(settings.path())
}
