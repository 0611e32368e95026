//! Table Importer - load CSV files into an embedded DuckDB database
//!
//! Provides:
//! - Settings loading for database identity and import options
//! - Idempotent database creation with a metadata table
//! - CSV reading with encoding detection and cell typing
//! - Column name and row cleaning
//! - Schema reconciliation and transactional writes (append, replace, fail)
//! - Promotion of `raw*` tables into de-duplicated `stg*` tables

pub mod cleaner;
pub mod config;
pub mod database;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod promote;
pub mod reader;
pub mod reconcile;
pub mod writer;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use cleaner::{CleanStats, clean, clean_column_name};
pub use config::{
    ConfigFormat, DatabaseKind, DatabaseSettings, ImportSettings, METADATA_TABLE, OnTableExists,
    load_database_settings, load_import_settings,
};
pub use database::{Database, TableColumn, TableSummary};
pub use dataset::{CellValue, ColumnType, Dataset};
pub use error::{ErrorKind, ImportError};
pub use pipeline::{ImportAction, ImportOutcome, ImportReport, import_csv, run, run_with_config};
pub use promote::{PromoteStats, TablePromotion, promote_all, promote_table, raw_tables, staging_table_name};
pub use reader::{CsvReader, read_csv};
pub use reconcile::{WritePlan, reconcile};
pub use writer::WriteStats;
