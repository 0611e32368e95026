//! SQL text for the metadata table and identifier quoting

use crate::config::METADATA_TABLE;

/// Quote an identifier for use in SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema of the `_database_metadata` bookkeeping table
pub struct MetadataSchema;

impl MetadataSchema {
    /// DDL for the metadata table
    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
    key VARCHAR PRIMARY KEY,
    value VARCHAR,
    created_at VARCHAR
);",
            quote_identifier(METADATA_TABLE)
        )
    }

    /// Insert or overwrite an entry
    pub fn upsert() -> String {
        format!(
            "INSERT INTO {} (key, value, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, created_at = excluded.created_at",
            quote_identifier(METADATA_TABLE)
        )
    }

    /// Insert an entry unless the key is already present
    pub fn insert_if_absent() -> String {
        format!(
            "INSERT INTO {} (key, value, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO NOTHING",
            quote_identifier(METADATA_TABLE)
        )
    }

    /// Read one entry
    pub fn select_value() -> String {
        format!(
            "SELECT value FROM {} WHERE key = ?1",
            quote_identifier(METADATA_TABLE)
        )
    }
}

/// Timestamp format used in the metadata table
pub fn metadata_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("RawAccount"), "\"RawAccount\"");
        assert_eq!(quote_identifier("first name"), "\"first name\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_metadata_schema() {
        let ddl = MetadataSchema::create_table();
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS \"_database_metadata\""));
        assert!(MetadataSchema::upsert().contains("ON CONFLICT (key) DO UPDATE"));
    }
}
