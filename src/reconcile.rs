//! Schema reconciliation
//!
//! Decides how a cleaned dataset meets the persistent table it targets. No
//! writes happen here; the result is a [`WritePlan`] for the writer.

use std::collections::HashMap;

use crate::config::OnTableExists;
use crate::database::{Database, TableColumn};
use crate::dataset::{ColumnDef, Dataset};
use crate::error::ImportError;

/// How the writer should materialize a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePlan {
    /// Table is absent; create it with these columns
    Create { table: String, columns: Vec<ColumnDef> },
    /// Table exists; insert into these stored columns, one per dataset column
    Append {
        table: String,
        columns: Vec<TableColumn>,
        /// Table columns the dataset does not provide; stored as null
        omitted: Vec<String>,
    },
    /// Table exists; drop it and create it with these columns
    Replace { table: String, columns: Vec<ColumnDef> },
}

impl WritePlan {
    /// Table the plan writes to, in its stored spelling
    pub fn table(&self) -> &str {
        match self {
            WritePlan::Create { table, .. }
            | WritePlan::Append { table, .. }
            | WritePlan::Replace { table, .. } => table,
        }
    }

    /// Table columns left null by the write
    pub fn omitted_columns(&self) -> &[String] {
        match self {
            WritePlan::Append { omitted, .. } => omitted,
            _ => &[],
        }
    }
}

/// Plan the write of `dataset` into `table` under `policy`
pub fn reconcile(
    db: &Database,
    table: &str,
    dataset: &Dataset,
    policy: OnTableExists,
) -> Result<WritePlan, ImportError> {
    let Some(stored) = db.find_table(table)? else {
        tracing::debug!("Table {} absent, planning create", table);
        return Ok(WritePlan::Create {
            table: table.to_string(),
            columns: dataset.infer_column_defs(),
        });
    };

    match policy {
        OnTableExists::Fail => Err(ImportError::TableAlreadyExists(stored)),
        OnTableExists::Replace => {
            tracing::debug!("Table {} exists, planning replace", stored);
            Ok(WritePlan::Replace {
                table: stored,
                columns: dataset.infer_column_defs(),
            })
        }
        OnTableExists::Append => {
            let existing = db.table_columns(&stored)?;
            plan_append(stored, &existing, dataset)
        }
    }
}

/// Map dataset columns onto the stored table columns, case-insensitively
fn plan_append(
    table: String,
    existing: &[TableColumn],
    dataset: &Dataset,
) -> Result<WritePlan, ImportError> {
    let by_lower: HashMap<String, &TableColumn> = existing
        .iter()
        .map(|c| (c.name.to_lowercase(), c))
        .collect();

    let mut columns = Vec::with_capacity(dataset.column_count());
    let mut unknown = Vec::new();
    for name in &dataset.columns {
        match by_lower.get(&name.to_lowercase()) {
            Some(stored) => columns.push((*stored).clone()),
            None => unknown.push(name.clone()),
        }
    }

    if !unknown.is_empty() {
        return Err(ImportError::SchemaMismatch {
            table,
            columns: unknown,
        });
    }

    let omitted: Vec<String> = existing
        .iter()
        .filter(|c| !columns.contains(c))
        .map(|c| c.name.clone())
        .collect();

    if !omitted.is_empty() {
        tracing::debug!(
            "Appending to {} without columns: {}",
            table,
            omitted.join(", ")
        );
    }

    Ok(WritePlan::Append {
        table,
        columns,
        omitted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CellValue, ColumnType};

    fn db_with_sales() -> Database {
        let db = Database::memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE \"Sales\" (\"Id\" BIGINT, \"Amount\" DOUBLE, \"Note\" VARCHAR);",
            )
            .unwrap();
        db
    }

    fn dataset(columns: &[&str]) -> Dataset {
        Dataset::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            vec![columns.iter().map(|_| CellValue::Integer(1)).collect()],
        )
    }

    #[test]
    fn test_absent_table_plans_create() {
        let db = Database::memory().unwrap();
        let plan = reconcile(&db, "sales", &dataset(&["id"]), OnTableExists::Fail).unwrap();
        match plan {
            WritePlan::Create { table, columns } => {
                assert_eq!(table, "sales");
                assert_eq!(columns.len(), 1);
                assert_eq!(columns[0].column_type, ColumnType::BigInt);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_fail_policy() {
        let db = db_with_sales();
        let err = reconcile(&db, "sales", &dataset(&["id"]), OnTableExists::Fail).unwrap_err();
        assert!(matches!(err, ImportError::TableAlreadyExists(name) if name == "Sales"));
    }

    #[test]
    fn test_replace_policy_uses_stored_name() {
        let db = db_with_sales();
        let plan = reconcile(&db, "SALES", &dataset(&["x"]), OnTableExists::Replace).unwrap();
        assert!(matches!(plan, WritePlan::Replace { ref table, .. } if table == "Sales"));
    }

    #[test]
    fn test_append_subset_maps_to_stored_spelling() {
        let db = db_with_sales();
        let plan = reconcile(&db, "sales", &dataset(&["amount", "ID"]), OnTableExists::Append).unwrap();
        assert_eq!(
            plan,
            WritePlan::Append {
                table: "Sales".to_string(),
                columns: vec![
                    TableColumn {
                        name: "Amount".to_string(),
                        data_type: "DOUBLE".to_string(),
                    },
                    TableColumn {
                        name: "Id".to_string(),
                        data_type: "BIGINT".to_string(),
                    },
                ],
                omitted: vec!["Note".to_string()],
            }
        );
        assert_eq!(plan.omitted_columns(), ["Note".to_string()]);
    }

    #[test]
    fn test_append_unknown_columns_mismatch() {
        let db = db_with_sales();
        let err = reconcile(
            &db,
            "sales",
            &dataset(&["id", "region", "channel"]),
            OnTableExists::Append,
        )
        .unwrap_err();
        match err {
            ImportError::SchemaMismatch { table, columns } => {
                assert_eq!(table, "Sales");
                assert_eq!(columns, vec!["region", "channel"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
