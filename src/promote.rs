//! Raw to staging promotion
//!
//! Every table named `raw*` gets a `stg*` counterpart holding its distinct
//! rows plus two lineage columns. Re-running a promotion only inserts rows
//! the staging table does not hold yet.

use std::collections::HashMap;

use duckdb::Transaction;
use serde::{Deserialize, Serialize};

use crate::database::{Database, TableColumn, catalog, quote_identifier, schema::metadata_timestamp};
use crate::error::{ErrorKind, ImportError};

/// Staging column holding the promotion timestamp
pub const LOADED_AT_COLUMN: &str = "_loaded_at";
/// Staging column holding the raw table a row came from
pub const SOURCE_TABLE_COLUMN: &str = "_source_table";

/// Statistics for one promoted table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteStats {
    pub raw_table: String,
    pub staging_table: String,
    /// Rows in the raw table
    pub raw_rows: i64,
    /// Raw rows that repeat an earlier raw row
    pub duplicates_in_raw: i64,
    pub rows_inserted: i64,
    /// Distinct raw rows the staging table already held
    pub already_staged: i64,
    pub staging_total: i64,
}

/// Result of promoting one raw table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TablePromotion {
    Promoted(PromoteStats),
    Failed {
        raw_table: String,
        staging_table: String,
        kind: ErrorKind,
        message: String,
    },
}

impl TablePromotion {
    pub fn is_success(&self) -> bool {
        matches!(self, TablePromotion::Promoted(_))
    }
}

/// Staging name for a raw table
///
/// A `Raw`, `raw` or `RAW` prefix becomes `stg`; any other name gets `stg_`
/// prepended.
pub fn staging_table_name(raw_table: &str) -> String {
    for prefix in ["Raw", "raw", "RAW"] {
        if let Some(rest) = raw_table.strip_prefix(prefix) {
            return format!("stg{}", rest);
        }
    }
    format!("stg_{}", raw_table)
}

/// User tables whose name starts with `raw` in any case
pub fn raw_tables(db: &Database) -> Result<Vec<String>, ImportError> {
    let names = catalog::table_names(db.connection())?;
    Ok(names
        .into_iter()
        .filter(|name| name.to_lowercase().starts_with("raw"))
        .collect())
}

/// Promote one raw table into its staging table as a single unit of work
pub fn promote_table(db: &mut Database, raw_table: &str) -> Result<PromoteStats, ImportError> {
    let raw = db
        .find_table(raw_table)?
        .ok_or_else(|| ImportError::Database(format!("Table not found: {}", raw_table)))?;
    let staging = staging_table_name(&raw);

    let tx = db.transaction()?;
    let stats = promote_in(&tx, &raw, &staging)?;
    tx.commit().map_err(|e| write_failed(&staging, e))?;

    tracing::info!(
        "Promoted {} -> {}: {} inserted, {} already staged, {} total",
        stats.raw_table,
        stats.staging_table,
        stats.rows_inserted,
        stats.already_staged,
        stats.staging_total
    );
    Ok(stats)
}

/// Promote every raw table, continuing past failures
pub fn promote_all(db: &mut Database) -> Result<Vec<TablePromotion>, ImportError> {
    let tables = raw_tables(db)?;
    if tables.is_empty() {
        tracing::warn!("No raw tables found");
    }

    let mut results = Vec::with_capacity(tables.len());
    for raw in tables {
        match promote_table(db, &raw) {
            Ok(stats) => results.push(TablePromotion::Promoted(stats)),
            Err(err) => {
                tracing::warn!("Promotion of {} failed: {}", raw, err);
                results.push(TablePromotion::Failed {
                    staging_table: staging_table_name(&raw),
                    raw_table: raw,
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }
    }
    Ok(results)
}

fn write_failed(table: &str, err: duckdb::Error) -> ImportError {
    ImportError::WriteFailed {
        table: table.to_string(),
        reason: err.to_string(),
    }
}

fn promote_in(tx: &Transaction<'_>, raw: &str, staging: &str) -> Result<PromoteStats, ImportError> {
    let failed = |e: duckdb::Error| write_failed(staging, e);

    let raw_columns = catalog::table_columns(tx, raw).map_err(failed)?;
    let staging = match catalog::find_table(tx, staging).map_err(failed)? {
        Some(stored) => stored,
        None => {
            tx.execute_batch(&create_staging_sql(staging, &raw_columns))
                .map_err(failed)?;
            tracing::debug!("Created staging table {}", staging);
            staging.to_string()
        }
    };
    let failed = |e: duckdb::Error| write_failed(&staging, e);

    let staging_columns = catalog::table_columns(tx, &staging).map_err(failed)?;
    let targets = map_columns(&staging, &raw_columns, &staging_columns)?;

    let raw_ident = quote_identifier(raw);
    let staging_ident = quote_identifier(&staging);
    let raw_list = column_list(raw_columns.iter().map(|c| c.name.as_str()));
    let staging_list = column_list(targets.iter().map(String::as_str));

    let raw_rows = catalog::row_count(tx, raw).map_err(failed)?;
    let distinct_rows: i64 = tx
        .query_row(
            &format!("SELECT COUNT(*) FROM (SELECT DISTINCT {raw_list} FROM {raw_ident})"),
            [],
            |row| row.get(0),
        )
        .map_err(failed)?;

    let insert = format!(
        "INSERT INTO {staging_ident} ({staging_list}, {loaded}, {source})
         SELECT *, CAST(?1 AS VARCHAR), CAST(?2 AS VARCHAR) FROM (
             SELECT DISTINCT {raw_list} FROM {raw_ident}
             EXCEPT
             SELECT {staging_list} FROM {staging_ident}
         ) AS fresh",
        loaded = quote_identifier(LOADED_AT_COLUMN),
        source = quote_identifier(SOURCE_TABLE_COLUMN),
    );
    let inserted = tx
        .execute(&insert, [metadata_timestamp().as_str(), raw])
        .map_err(failed)? as i64;

    let staging_total = catalog::row_count(tx, &staging).map_err(failed)?;
    catalog::record_metadata(tx, "last_stg_processing", &metadata_timestamp()).map_err(failed)?;

    Ok(PromoteStats {
        raw_table: raw.to_string(),
        staging_table: staging,
        raw_rows,
        duplicates_in_raw: raw_rows - distinct_rows,
        rows_inserted: inserted,
        already_staged: distinct_rows - inserted,
        staging_total,
    })
}

/// DDL for a staging table mirroring `columns`
pub fn create_staging_sql(staging: &str, columns: &[TableColumn]) -> String {
    let mut defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.data_type))
        .collect();
    defs.push(format!("{} VARCHAR", quote_identifier(LOADED_AT_COLUMN)));
    defs.push(format!("{} VARCHAR", quote_identifier(SOURCE_TABLE_COLUMN)));
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(staging),
        defs.join(", ")
    )
}

/// Staging column for each raw column, matched case-insensitively
fn map_columns(
    staging: &str,
    raw_columns: &[TableColumn],
    staging_columns: &[TableColumn],
) -> Result<Vec<String>, ImportError> {
    let data_columns: HashMap<String, &str> = staging_columns
        .iter()
        .filter(|c| c.name != LOADED_AT_COLUMN && c.name != SOURCE_TABLE_COLUMN)
        .map(|c| (c.name.to_lowercase(), c.name.as_str()))
        .collect();

    let mut targets = Vec::with_capacity(raw_columns.len());
    let mut unknown = Vec::new();
    for column in raw_columns {
        match data_columns.get(&column.name.to_lowercase()) {
            Some(stored) => targets.push(stored.to_string()),
            None => unknown.push(column.name.clone()),
        }
    }

    if unknown.is_empty() {
        Ok(targets)
    } else {
        Err(ImportError::SchemaMismatch {
            table: staging.to_string(),
            columns: unknown,
        })
    }
}

fn column_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote_identifier).collect::<Vec<_>>().join(", ")
}
