//! Configuration for database identity and import options

pub mod loader;
pub mod settings;

pub use loader::{
    ConfigFormat, load_database_settings, load_import_settings, parse_database_settings,
    parse_import_settings,
};
pub use settings::{DatabaseKind, DatabaseSettings, ImportSettings, METADATA_TABLE, OnTableExists};
