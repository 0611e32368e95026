//! Catalog queries shared by plain connections and open transactions
//!
//! Every function takes a `&Connection`; a `duckdb::Transaction` derefs to
//! one, so the writer can ask the same questions inside its unit of work.

use duckdb::Connection;
use duckdb::types::Value;
use serde::{Deserialize, Serialize};

use super::schema::{MetadataSchema, metadata_timestamp, quote_identifier};
use crate::config::METADATA_TABLE;

/// A column of a persistent table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub data_type: String,
}

/// Stored spelling of a user table, matched case-insensitively
pub fn find_table(conn: &Connection, name: &str) -> duckdb::Result<Option<String>> {
    let mut stmt = conn.prepare(
        "SELECT table_name FROM information_schema.tables
         WHERE table_schema = 'main' AND table_type = 'BASE TABLE'
           AND lower(table_name) = lower(?1)
         ORDER BY table_name = ?1 DESC
         LIMIT 1",
    )?;
    let mut rows = stmt.query([name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// Names of all user tables, metadata table excluded
pub fn table_names(conn: &Connection) -> duckdb::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT table_name FROM information_schema.tables
         WHERE table_schema = 'main' AND table_type = 'BASE TABLE' AND table_name <> ?1
         ORDER BY table_name",
    )?;
    let rows = stmt.query_map([METADATA_TABLE], |row| row.get::<_, String>(0))?;
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

/// Columns of `table` in declaration order
pub fn table_columns(conn: &Connection, table: &str) -> duckdb::Result<Vec<TableColumn>> {
    let mut columns = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type FROM information_schema.columns
         WHERE table_schema = 'main' AND table_name = ?1
         ORDER BY ordinal_position",
    )?;
    let rows = stmt.query_map([table], |row| {
        Ok(TableColumn {
            name: row.get(0)?,
            data_type: row.get(1)?,
        })
    })?;
    for row in rows {
        columns.push(row?);
    }
    Ok(columns)
}

/// Number of rows in `table`
pub fn row_count(conn: &Connection, table: &str) -> duckdb::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
        [],
        |row| row.get(0),
    )
}

/// Whether the metadata table exists
pub fn has_metadata_table(conn: &Connection) -> duckdb::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE table_schema = 'main' AND table_name = ?1",
        [METADATA_TABLE],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Write a metadata entry if the metadata table exists
///
/// Returns whether the entry was written.
pub fn record_metadata(conn: &Connection, key: &str, value: &str) -> duckdb::Result<bool> {
    if !has_metadata_table(conn)? {
        return Ok(false);
    }
    let now = metadata_timestamp();
    conn.execute(&MetadataSchema::upsert(), [key, value, now.as_str()])?;
    Ok(true)
}

/// Read a metadata entry
pub fn metadata_value(conn: &Connection, key: &str) -> duckdb::Result<Option<String>> {
    if !has_metadata_table(conn)? {
        return Ok(None);
    }
    let mut stmt = conn.prepare(&MetadataSchema::select_value())?;
    let mut rows = stmt.query([key])?;
    match rows.next()? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(None),
    }
}

/// Render a stored value for display
pub fn render_value(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(b) => b.to_string(),
        Value::TinyInt(n) => n.to_string(),
        Value::SmallInt(n) => n.to_string(),
        Value::Int(n) => n.to_string(),
        Value::BigInt(n) => n.to_string(),
        Value::HugeInt(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Text(s) => s,
        other => format!("{:?}", other),
    }
}

/// Last `limit` rows of `table` in insertion order, rendered as text
pub fn tail_rows(conn: &Connection, table: &str, limit: usize) -> duckdb::Result<Vec<Vec<String>>> {
    let total = row_count(conn, table)?.max(0) as usize;
    let offset = total.saturating_sub(limit);
    let column_count = table_columns(conn, table)?.len();

    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} ORDER BY rowid LIMIT {} OFFSET {}",
        quote_identifier(table),
        limit,
        offset
    ))?;
    let mut rows = stmt.query([])?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut rendered = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value: Value = row.get(i)?;
            rendered.push(render_value(value));
        }
        result.push(rendered);
    }
    Ok(result)
}
