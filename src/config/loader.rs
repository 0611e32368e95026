//! Loading and validating settings files
//!
//! Both configuration records can be written as JSON, TOML or YAML; the
//! format is picked from the file extension. Keys used by the older
//! `database_config.json` / `csv_import_config.json` files are accepted as
//! aliases, and import options may live either at the top level or inside an
//! `import_settings` section.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::settings::{DatabaseKind, DatabaseSettings, ImportSettings, OnTableExists};
use crate::error::ImportError;

/// Serialization format of a settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from a file extension (JSON when unknown)
    pub fn from_path(path: &Path) -> Self {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension.to_lowercase().as_str() {
            "toml" => ConfigFormat::Toml,
            "yaml" | "yml" => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseFile {
    #[serde(alias = "name")]
    database_name: Option<String>,
    #[serde(alias = "type")]
    database_type: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ImportOptions {
    remove_duplicates: Option<bool>,
    #[serde(alias = "fill_missing_values")]
    fill_missing: Option<bool>,
    #[serde(alias = "missing_value_replacement")]
    missing_fill_value: Option<String>,
    #[serde(alias = "if_table_exists")]
    on_table_exists: Option<String>,
    clean_column_names: Option<bool>,
    trim_header_spaces: Option<bool>,
    skip_empty_rows: Option<bool>,
    delimiter: Option<String>,
}

impl ImportOptions {
    /// Fill unset options from `fallback`
    fn or(self, fallback: ImportOptions) -> ImportOptions {
        ImportOptions {
            remove_duplicates: self.remove_duplicates.or(fallback.remove_duplicates),
            fill_missing: self.fill_missing.or(fallback.fill_missing),
            missing_fill_value: self.missing_fill_value.or(fallback.missing_fill_value),
            on_table_exists: self.on_table_exists.or(fallback.on_table_exists),
            clean_column_names: self.clean_column_names.or(fallback.clean_column_names),
            trim_header_spaces: self.trim_header_spaces.or(fallback.trim_header_spaces),
            skip_empty_rows: self.skip_empty_rows.or(fallback.skip_empty_rows),
            delimiter: self.delimiter.or(fallback.delimiter),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(alias = "csv_file_path")]
    source_path: Option<PathBuf>,
    #[serde(alias = "table_name")]
    target_table: Option<String>,
    #[serde(default)]
    import_settings: ImportOptions,
    #[serde(flatten)]
    options: ImportOptions,
}

fn read_config(path: &Path) -> Result<String, ImportError> {
    fs::read_to_string(path).map_err(|e| {
        ImportError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
    })
}

/// Load the database settings file
pub fn load_database_settings(path: &Path) -> Result<DatabaseSettings, ImportError> {
    let content = read_config(path)?;
    parse_database_settings(&content, ConfigFormat::from_path(path))
        .map_err(|e| ImportError::InvalidConfig(format!("{}: {}", path.display(), e)))
}

/// Load the import settings file
pub fn load_import_settings(path: &Path) -> Result<ImportSettings, ImportError> {
    let content = read_config(path)?;
    parse_import_settings(&content, ConfigFormat::from_path(path))
        .map_err(|e| ImportError::InvalidConfig(format!("{}: {}", path.display(), e)))
}

/// Parse database settings from text
pub fn parse_database_settings(
    content: &str,
    format: ConfigFormat,
) -> Result<DatabaseSettings, String> {
    let file: DatabaseFile = format.parse(content)?;

    let name = file
        .database_name
        .filter(|n| !n.trim().is_empty())
        .ok_or("missing required field `database_name`")?;

    let kind = match file.database_type {
        Some(kind) => kind.parse::<DatabaseKind>()?,
        None => DatabaseKind::default(),
    };

    Ok(DatabaseSettings {
        name,
        kind,
        description: file.description,
    })
}

/// Parse import settings from text
pub fn parse_import_settings(content: &str, format: ConfigFormat) -> Result<ImportSettings, String> {
    let file: ImportFile = format.parse(content)?;

    let source_path = file
        .source_path
        .ok_or("missing required field `source_path`")?;
    let target_table = file
        .target_table
        .ok_or("missing required field `target_table`")?;

    let mut settings = ImportSettings::new(source_path, target_table);
    let options = file.options.or(file.import_settings);

    if let Some(enabled) = options.remove_duplicates {
        settings.remove_duplicates = enabled;
    }
    if let Some(enabled) = options.fill_missing {
        settings.fill_missing = enabled;
    }
    if let Some(value) = options.missing_fill_value {
        settings.missing_fill_value = value;
    }
    if let Some(policy) = options.on_table_exists {
        settings.on_table_exists = policy.parse::<OnTableExists>()?;
    }
    if let Some(enabled) = options.clean_column_names {
        settings.clean_column_names = enabled;
    }
    if let Some(enabled) = options.trim_header_spaces {
        settings.trim_header_spaces = enabled;
    }
    if let Some(enabled) = options.skip_empty_rows {
        settings.skip_empty_rows = enabled;
    }
    if let Some(delimiter) = options.delimiter {
        settings.delimiter = parse_delimiter(&delimiter)?;
    }

    settings.validate()?;
    Ok(settings)
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ if value.len() == 1 && value.is_ascii() => Ok(value.as_bytes()[0]),
        _ => Err(format!(
            "Invalid delimiter: {:?}. Expected a single ASCII character",
            value
        )),
    }
}
