//! Settings file loading tests

use std::fs;
use std::path::PathBuf;

use table_importer::{
    DatabaseKind, ImportError, OnTableExists, load_database_settings, load_import_settings,
};
use tempfile::TempDir;

mod database_config_tests {
    use super::*;

    #[test]
    fn test_load_json_database_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database_config.json");
        fs::write(
            &path,
            r#"{"database_name": "sales.duckdb", "database_type": "duckdb", "description": "Sales data"}"#,
        )
        .unwrap();

        let settings = load_database_settings(&path).unwrap();
        assert_eq!(settings.name, "sales.duckdb");
        assert_eq!(settings.kind, DatabaseKind::DuckDb);
        assert_eq!(settings.description.as_deref(), Some("Sales data"));
    }

    #[test]
    fn test_unsupported_database_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database_config.json");
        fs::write(&path, r#"{"database_name": "x.db", "database_type": "oracle"}"#).unwrap();

        let err = load_database_settings(&path).unwrap_err();
        assert!(matches!(err, ImportError::InvalidConfig(ref msg) if msg.contains("oracle")));
    }

    #[test]
    fn test_missing_database_config_file() {
        let dir = TempDir::new().unwrap();
        let err = load_database_settings(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ImportError::InvalidConfig(_)));
    }
}

mod import_config_tests {
    use super::*;

    #[test]
    fn test_defaults_when_only_required_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, r#"{"source_path": "a.csv", "target_table": "RawA"}"#).unwrap();

        let settings = load_import_settings(&path).unwrap();
        assert_eq!(settings.source_path, PathBuf::from("a.csv"));
        assert!(settings.remove_duplicates);
        assert!(settings.fill_missing);
        assert_eq!(settings.missing_fill_value, "NULL");
        assert_eq!(settings.on_table_exists, OnTableExists::Append);
        assert!(!settings.clean_column_names);
        assert!(settings.trim_header_spaces);
        assert!(settings.skip_empty_rows);
        assert_eq!(settings.delimiter, b',');
    }

    #[test]
    fn test_load_toml_import_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.toml");
        fs::write(
            &path,
            r#"
source_path = "data/accounts.csv"
target_table = "RawAccount"
on_table_exists = "Replace"
clean_column_names = true
delimiter = ";"
"#,
        )
        .unwrap();

        let settings = load_import_settings(&path).unwrap();
        assert_eq!(settings.target_table, "RawAccount");
        assert_eq!(settings.on_table_exists, OnTableExists::Replace);
        assert!(settings.clean_column_names);
        assert_eq!(settings.delimiter, b';');
    }

    #[test]
    fn test_load_yaml_with_legacy_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.yml");
        fs::write(
            &path,
            "csv_file_path: a.csv\ntable_name: RawA\nimport_settings:\n  fill_missing_values: false\n  missing_value_replacement: 'n/a'\n  if_table_exists: fail\n",
        )
        .unwrap();

        let settings = load_import_settings(&path).unwrap();
        assert_eq!(settings.target_table, "RawA");
        assert!(!settings.fill_missing);
        assert_eq!(settings.missing_fill_value, "n/a");
        assert_eq!(settings.on_table_exists, OnTableExists::Fail);
    }

    #[test]
    fn test_missing_target_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, r#"{"source_path": "a.csv"}"#).unwrap();

        let err = load_import_settings(&path).unwrap_err();
        assert!(matches!(err, ImportError::InvalidConfig(ref msg) if msg.contains("target_table")));
    }
}
