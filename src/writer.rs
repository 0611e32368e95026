//! Transactional table writer
//!
//! Executes a [`WritePlan`] as one unit of work. Any error, including a
//! value the column type rejects, rolls back the whole write, a preceding
//! `DROP TABLE` included.

use duckdb::Transaction;

use crate::database::{Database, catalog, quote_identifier, schema::metadata_timestamp};
use crate::dataset::{ColumnDef, Dataset};
use crate::error::ImportError;
use crate::reconcile::WritePlan;

/// Row counts observed inside the write transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    /// Table rows before the write (0 when created)
    pub rows_before: i64,
    pub rows_written: usize,
    pub rows_after: i64,
}

/// Write `dataset` according to `plan`
pub fn write(
    db: &mut Database,
    plan: &WritePlan,
    dataset: &Dataset,
) -> Result<WriteStats, ImportError> {
    let table = plan.table().to_string();
    let failed = |e: duckdb::Error| ImportError::WriteFailed {
        table: table.clone(),
        reason: e.to_string(),
    };

    let tx = db.transaction()?;
    let stats = apply(&tx, plan, dataset).map_err(&failed)?;
    tx.commit().map_err(&failed)?;

    tracing::info!("Wrote {} rows to {}", stats.rows_written, table);
    Ok(stats)
}

fn apply(tx: &Transaction<'_>, plan: &WritePlan, dataset: &Dataset) -> duckdb::Result<WriteStats> {
    let table = plan.table();

    let (rows_before, targets): (i64, Vec<(String, String)>) = match plan {
        WritePlan::Create { columns, .. } => {
            tx.execute_batch(&create_table_sql(table, columns))?;
            (0, targets_from_defs(columns))
        }
        WritePlan::Replace { columns, .. } => {
            let before = catalog::row_count(tx, table)?;
            tx.execute_batch(&format!("DROP TABLE {}", quote_identifier(table)))?;
            tx.execute_batch(&create_table_sql(table, columns))?;
            (before, targets_from_defs(columns))
        }
        WritePlan::Append { columns, .. } => (
            catalog::row_count(tx, table)?,
            columns
                .iter()
                .map(|c| (c.name.clone(), c.data_type.clone()))
                .collect(),
        ),
    };

    let rows_written = insert_rows(tx, table, &targets, dataset)?;

    let key = format!("last_import_{}", table);
    catalog::record_metadata(tx, &key, &metadata_timestamp())?;

    Ok(WriteStats {
        rows_before,
        rows_written,
        rows_after: catalog::row_count(tx, table)?,
    })
}

fn targets_from_defs(columns: &[ColumnDef]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|c| (c.name.clone(), c.column_type.sql_type().to_string()))
        .collect()
}

/// DDL for a new table
pub fn create_table_sql(table: &str, columns: &[ColumnDef]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.column_type.sql_type()))
        .collect();
    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table),
        defs.join(", ")
    )
}

/// Insert every row; `targets` pairs each dataset column with its stored name and type
fn insert_rows(
    tx: &Transaction<'_>,
    table: &str,
    targets: &[(String, String)],
    dataset: &Dataset,
) -> duckdb::Result<usize> {
    if dataset.rows.is_empty() {
        return Ok(0);
    }

    let column_list: Vec<String> = targets
        .iter()
        .map(|(name, _)| quote_identifier(name))
        .collect();
    let placeholders = vec!["?"; targets.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        column_list.join(", "),
        placeholders
    );

    let mut stmt = tx.prepare(&sql)?;
    let mut written = 0;
    for row in &dataset.rows {
        let mut values = Vec::with_capacity(targets.len());
        for (cell, (name, sql_type)) in row.iter().zip(targets) {
            let value = cell.bind_value(sql_type).map_err(|reason| {
                let message = format!("column '{}': {}", name, reason);
                duckdb::Error::ToSqlConversionFailure(message.into())
            })?;
            values.push(value);
        }
        written += stmt.execute(duckdb::params_from_iter(values))?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CellValue, ColumnType};

    fn people() -> Dataset {
        Dataset::from_rows(
            vec!["id".into(), "name".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::Text("Ada".into())],
                vec![CellValue::Integer(2), CellValue::Null],
            ],
        )
    }

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql(
            "My Table",
            &[
                ColumnDef {
                    name: "id".into(),
                    column_type: ColumnType::BigInt,
                },
                ColumnDef {
                    name: "full name".into(),
                    column_type: ColumnType::Varchar,
                },
            ],
        );
        assert_eq!(
            sql,
            "CREATE TABLE \"My Table\" (\"id\" BIGINT, \"full name\" VARCHAR)"
        );
    }

    #[test]
    fn test_create_and_insert() {
        let mut db = Database::memory().unwrap();
        let dataset = people();
        let plan = WritePlan::Create {
            table: "people".into(),
            columns: dataset.infer_column_defs(),
        };

        let stats = write(&mut db, &plan, &dataset).unwrap();
        assert_eq!(
            stats,
            WriteStats {
                rows_before: 0,
                rows_written: 2,
                rows_after: 2,
            }
        );
        assert_eq!(db.row_count("people").unwrap(), 2);
        assert_eq!(
            db.tail_rows("people", 1).unwrap(),
            vec![vec!["2".to_string(), String::new()]]
        );
    }

    #[test]
    fn test_records_last_import_when_metadata_exists() {
        let mut db = Database::memory().unwrap();
        db.init_metadata("test", None).unwrap();
        let dataset = people();
        let plan = WritePlan::Create {
            table: "people".into(),
            columns: dataset.infer_column_defs(),
        };
        write(&mut db, &plan, &dataset).unwrap();

        assert!(db.metadata("last_import_people").unwrap().is_some());
    }

    #[test]
    fn test_failed_write_rolls_back_replace() {
        let mut db = Database::memory().unwrap();
        let dataset = people();
        let plan = WritePlan::Create {
            table: "people".into(),
            columns: dataset.infer_column_defs(),
        };
        write(&mut db, &plan, &dataset).unwrap();

        // Declared BIGINT, but the second row carries text
        let bad = Dataset::from_rows(
            vec!["id".into()],
            vec![
                vec![CellValue::Integer(5)],
                vec![CellValue::Text("not a number".into())],
            ],
        );
        let plan = WritePlan::Replace {
            table: "people".into(),
            columns: vec![ColumnDef {
                name: "id".into(),
                column_type: ColumnType::BigInt,
            }],
        };
        let err = write(&mut db, &plan, &bad).unwrap_err();
        assert!(matches!(err, ImportError::WriteFailed { ref table, .. } if table == "people"));

        // Drop was rolled back with the inserts
        assert_eq!(db.row_count("people").unwrap(), 2);
        assert_eq!(db.table_columns("people").unwrap().len(), 2);
    }

    #[test]
    fn test_decimal_into_integer_column_rolls_back() {
        let mut db = Database::memory().unwrap();
        db.connection()
            .execute_batch("CREATE TABLE stock (qty BIGINT); INSERT INTO stock VALUES (1), (2);")
            .unwrap();

        let dataset = Dataset::from_rows(
            vec!["qty".into()],
            vec![
                vec![CellValue::Integer(4)],
                vec![CellValue::from_field("2.7")],
            ],
        );
        let plan = WritePlan::Append {
            table: "stock".into(),
            columns: db.table_columns("stock").unwrap(),
            omitted: Vec::new(),
        };
        let err = write(&mut db, &plan, &dataset).unwrap_err();
        match err {
            ImportError::WriteFailed { table, reason } => {
                assert_eq!(table, "stock");
                assert!(reason.contains("2.7"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.row_count("stock").unwrap(), 2);
    }

    #[test]
    fn test_decimal_text_kept_in_varchar_column() {
        let mut db = Database::memory().unwrap();
        db.connection()
            .execute_batch("CREATE TABLE releases (version VARCHAR);")
            .unwrap();

        let dataset = Dataset::from_rows(
            vec!["version".into()],
            vec![
                vec![CellValue::from_field("1.10")],
                vec![CellValue::from_field("1e3")],
            ],
        );
        let plan = WritePlan::Append {
            table: "releases".into(),
            columns: db.table_columns("releases").unwrap(),
            omitted: Vec::new(),
        };
        let stats = write(&mut db, &plan, &dataset).unwrap();
        assert_eq!(stats.rows_before, 0);
        assert_eq!(stats.rows_after, 2);
        assert_eq!(
            db.tail_rows("releases", 2).unwrap(),
            vec![vec!["1.10".to_string()], vec!["1e3".to_string()]]
        );
    }
}
