//! Settings records handed to the import pipeline

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the bookkeeping table maintained next to user tables
pub const METADATA_TABLE: &str = "_database_metadata";

/// What to do when the target table already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnTableExists {
    /// Add rows to the existing table (default)
    #[default]
    Append,
    /// Drop the existing table and recreate it from the dataset
    Replace,
    /// Refuse to touch the existing table
    Fail,
}

impl std::str::FromStr for OnTableExists {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(OnTableExists::Append),
            "replace" => Ok(OnTableExists::Replace),
            "fail" => Ok(OnTableExists::Fail),
            _ => Err(format!(
                "Invalid on_table_exists value: {}. Expected: append, replace, fail",
                s
            )),
        }
    }
}

impl fmt::Display for OnTableExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnTableExists::Append => write!(f, "append"),
            OnTableExists::Replace => write!(f, "replace"),
            OnTableExists::Fail => write!(f, "fail"),
        }
    }
}

/// Supported embedded database engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[default]
    DuckDb,
}

impl std::str::FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duckdb" => Ok(DatabaseKind::DuckDb),
            _ => Err(format!("Unsupported database type: {}. Expected: duckdb", s)),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Identity of the database file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file name or path
    pub name: String,
    /// Engine type
    pub kind: DatabaseKind,
    /// Free-form description stored in the metadata table
    pub description: Option<String>,
}

impl DatabaseSettings {
    /// Create settings for a database file
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DatabaseKind::DuckDb,
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        Path::new(&self.name)
    }
}

/// Options for one import invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// CSV file to import
    pub source_path: PathBuf,
    /// Table that receives the rows
    pub target_table: String,
    /// Drop repeated rows within this import
    pub remove_duplicates: bool,
    /// Replace null and empty cells with `missing_fill_value`
    pub fill_missing: bool,
    /// Literal text written into missing cells
    pub missing_fill_value: String,
    /// Policy when `target_table` already exists
    pub on_table_exists: OnTableExists,
    /// Normalize header names to lower snake case
    pub clean_column_names: bool,
    /// Strip surrounding whitespace from header names
    pub trim_header_spaces: bool,
    /// Drop rows whose every cell is empty
    pub skip_empty_rows: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl ImportSettings {
    /// Create settings with the default cleaning options
    pub fn new(source_path: impl Into<PathBuf>, target_table: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_table: target_table.into(),
            remove_duplicates: true,
            fill_missing: true,
            missing_fill_value: "NULL".to_string(),
            on_table_exists: OnTableExists::Append,
            clean_column_names: false,
            trim_header_spaces: true,
            skip_empty_rows: true,
            delimiter: b',',
        }
    }

    /// Set the table-exists policy
    pub fn with_on_table_exists(mut self, policy: OnTableExists) -> Self {
        self.on_table_exists = policy;
        self
    }

    /// Enable or disable duplicate removal
    pub fn with_remove_duplicates(mut self, enabled: bool) -> Self {
        self.remove_duplicates = enabled;
        self
    }

    /// Enable or disable missing-value fill
    pub fn with_fill_missing(mut self, enabled: bool) -> Self {
        self.fill_missing = enabled;
        self
    }

    /// Set the text written into missing cells
    pub fn with_missing_fill_value(mut self, value: impl Into<String>) -> Self {
        self.missing_fill_value = value.into();
        self
    }

    /// Enable or disable column name cleaning
    pub fn with_clean_column_names(mut self, enabled: bool) -> Self {
        self.clean_column_names = enabled;
        self
    }

    /// Enable or disable header whitespace trimming
    pub fn with_trim_header_spaces(mut self, enabled: bool) -> Self {
        self.trim_header_spaces = enabled;
        self
    }

    /// Enable or disable blank row skipping
    pub fn with_skip_empty_rows(mut self, enabled: bool) -> Self {
        self.skip_empty_rows = enabled;
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.source_path.as_os_str().is_empty() {
            return Err("source_path must not be empty".to_string());
        }
        if self.target_table.trim().is_empty() {
            return Err("target_table must not be empty".to_string());
        }
        if self.target_table.eq_ignore_ascii_case(METADATA_TABLE) {
            return Err(format!(
                "target_table '{}' is reserved for database metadata",
                self.target_table
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_table_exists_from_str() {
        assert_eq!(
            "append".parse::<OnTableExists>().unwrap(),
            OnTableExists::Append
        );
        assert_eq!(
            "Replace".parse::<OnTableExists>().unwrap(),
            OnTableExists::Replace
        );
        assert_eq!("FAIL".parse::<OnTableExists>().unwrap(), OnTableExists::Fail);
        assert!("merge".parse::<OnTableExists>().is_err());
    }

    #[test]
    fn test_import_settings_defaults() {
        let settings = ImportSettings::new("data.csv", "RawAccount");
        assert!(settings.remove_duplicates);
        assert!(settings.fill_missing);
        assert_eq!(settings.missing_fill_value, "NULL");
        assert_eq!(settings.on_table_exists, OnTableExists::Append);
        assert!(!settings.clean_column_names);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_metadata_table() {
        let settings = ImportSettings::new("data.csv", "_DATABASE_METADATA");
        assert!(settings.validate().is_err());

        let settings = ImportSettings::new("data.csv", "  ");
        assert!(settings.validate().is_err());
    }
}
