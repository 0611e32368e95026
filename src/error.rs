//! Error types for import operations

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while importing a CSV file
#[derive(Error, Debug)]
pub enum ImportError {
    /// Source file missing or unreadable
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Source could not be parsed as delimited text
    #[error("Malformed source {}: {reason}", .path.display())]
    MalformedSource { path: PathBuf, reason: String },

    /// Column names are not unique (or empty) after header cleaning
    #[error("Ambiguous column name '{name}' produced by headers: {}", .headers.join(", "))]
    AmbiguousColumnName { name: String, headers: Vec<String> },

    /// Dataset introduces columns the existing table does not have
    #[error("Schema mismatch for table '{table}': unknown columns {}", .columns.join(", "))]
    SchemaMismatch { table: String, columns: Vec<String> },

    /// Table exists and the policy forbids touching it
    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    /// The transactional write failed and was rolled back
    #[error("Write to table '{table}' failed: {reason}")]
    WriteFailed { table: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database file does not exist
    #[error("Database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// Catalog or connection error outside a write
    #[error("Database error: {0}")]
    Database(String),
}

/// Machine-readable classification of an [`ImportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    SourceNotFound,
    MalformedSource,
    AmbiguousColumnName,
    SchemaMismatch,
    TableAlreadyExists,
    WriteFailed,
    InvalidConfig,
    DatabaseNotFound,
    Database,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SourceNotFound => "SourceNotFound",
            ErrorKind::MalformedSource => "MalformedSource",
            ErrorKind::AmbiguousColumnName => "AmbiguousColumnName",
            ErrorKind::SchemaMismatch => "SchemaMismatch",
            ErrorKind::TableAlreadyExists => "TableAlreadyExists",
            ErrorKind::WriteFailed => "WriteFailed",
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::DatabaseNotFound => "DatabaseNotFound",
            ErrorKind::Database => "Database",
        };
        f.write_str(name)
    }
}

impl ImportError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::SourceNotFound(_) => ErrorKind::SourceNotFound,
            ImportError::MalformedSource { .. } => ErrorKind::MalformedSource,
            ImportError::AmbiguousColumnName { .. } => ErrorKind::AmbiguousColumnName,
            ImportError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            ImportError::TableAlreadyExists(_) => ErrorKind::TableAlreadyExists,
            ImportError::WriteFailed { .. } => ErrorKind::WriteFailed,
            ImportError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            ImportError::DatabaseNotFound(_) => ErrorKind::DatabaseNotFound,
            ImportError::Database(_) => ErrorKind::Database,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ImportError::SourceNotFound(path) => {
                format!(
                    "Source file not found: {}\n\nHint: Check `source_path` in the import configuration.",
                    path.display()
                )
            }
            ImportError::MalformedSource { path, reason } => {
                format!(
                    "Could not parse {} as CSV.\nReason: {reason}\n\n\
                    Hint: Check the delimiter, quoting and the number of fields per row.",
                    path.display()
                )
            }
            ImportError::AmbiguousColumnName { name, headers } => {
                format!(
                    "Headers {} all map to the column name '{name}'.\n\n\
                    Hint: Rename the headers in the CSV file or disable `clean_column_names`.",
                    headers.join(", ")
                )
            }
            ImportError::SchemaMismatch { table, columns } => {
                format!(
                    "Columns not present in table '{table}': {}\n\n\
                    Hint: Remove those columns from the CSV, or set `on_table_exists` to \"replace\" \
                    to recreate the table.",
                    columns.join(", ")
                )
            }
            ImportError::TableAlreadyExists(table) => {
                format!(
                    "Table '{table}' already exists and `on_table_exists` is \"fail\".\n\n\
                    Hint: Use \"append\" to add rows or \"replace\" to recreate the table."
                )
            }
            ImportError::WriteFailed { table, reason } => {
                format!(
                    "Writing to table '{table}' failed and was rolled back.\nReason: {reason}\n\n\
                    Hint: The table is unchanged. Fix the data and re-run the import."
                )
            }
            ImportError::InvalidConfig(msg) => {
                format!("Invalid configuration: {msg}\n\nHint: Check your configuration files.")
            }
            ImportError::DatabaseNotFound(path) => {
                format!(
                    "Database not found: {}\n\nHint: Run 'table-importer init' first.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}

impl From<duckdb::Error> for ImportError {
    fn from(err: duckdb::Error) -> Self {
        ImportError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_names() {
        let err = ImportError::TableAlreadyExists("RawAccount".to_string());
        assert_eq!(err.kind(), ErrorKind::TableAlreadyExists);
        assert_eq!(err.kind().to_string(), "TableAlreadyExists");
    }

    #[test]
    fn test_schema_mismatch_names_columns() {
        let err = ImportError::SchemaMismatch {
            table: "sales".to_string(),
            columns: vec!["region".to_string(), "channel".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("region"));
        assert!(message.contains("channel"));
        assert!(err.user_message().contains("Hint"));
    }
}
