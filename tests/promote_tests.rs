//! Raw to staging promotion tests

use std::fs;
use std::path::Path;

use table_importer::{
    Database, ErrorKind, ImportSettings, OnTableExists, TablePromotion, import_csv, promote_all,
    promote_table, raw_tables,
};
use tempfile::TempDir;

fn import(db: &mut Database, dir: &Path, table: &str, content: &str) {
    let path = dir.join(format!("{}.csv", table));
    fs::write(&path, content).unwrap();
    let settings = ImportSettings::new(&path, table)
        .with_remove_duplicates(false)
        .with_on_table_exists(OnTableExists::Replace);
    import_csv(db, &settings).unwrap();
}

mod discovery_tests {
    use super::*;

    #[test]
    fn test_raw_tables_any_case() {
        let dir = TempDir::new().unwrap();
        let mut db = Database::memory().unwrap();
        import(&mut db, dir.path(), "RawAccount", "id\n1\n");
        import(&mut db, dir.path(), "rawContact", "id\n1\n");
        import(&mut db, dir.path(), "orders", "id\n1\n");

        let mut tables = raw_tables(&db).unwrap();
        tables.sort();
        assert_eq!(tables, vec!["RawAccount", "rawContact"]);
    }
}

mod promotion_tests {
    use super::*;

    #[test]
    fn test_rerun_inserts_nothing_new() {
        let dir = TempDir::new().unwrap();
        let mut db = Database::memory().unwrap();
        import(&mut db, dir.path(), "RawAccount", "id,name\n1,a\n1,a\n2,b\n");

        let first = promote_table(&mut db, "RawAccount").unwrap();
        assert_eq!(first.staging_table, "stgAccount");
        assert_eq!(first.raw_rows, 3);
        assert_eq!(first.duplicates_in_raw, 1);
        assert_eq!(first.rows_inserted, 2);

        let second = promote_table(&mut db, "RawAccount").unwrap();
        assert_eq!(second.rows_inserted, 0);
        assert_eq!(second.already_staged, 2);
        assert_eq!(second.staging_total, 2);

        let columns: Vec<String> = db
            .table_columns("stgAccount")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(columns, vec!["id", "name", "_loaded_at", "_source_table"]);
    }

    #[test]
    fn test_lineage_columns_filled() {
        let dir = TempDir::new().unwrap();
        let mut db = Database::memory().unwrap();
        import(&mut db, dir.path(), "rawCustomers", "id\n7\n");

        promote_table(&mut db, "rawCustomers").unwrap();

        let rows = db.tail_rows("stgCustomers", 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "7");
        assert!(!rows[0][1].is_empty());
        assert_eq!(rows[0][2], "rawCustomers");
    }

    #[test]
    fn test_promote_all_continues_past_failures() {
        let dir = TempDir::new().unwrap();
        let mut db = Database::memory().unwrap();
        import(&mut db, dir.path(), "RawAccount", "id\n1\n");
        import(&mut db, dir.path(), "RawContact", "id\n1\n");
        promote_all(&mut db).unwrap();

        // Replace RawAccount with a column the staging table lacks
        import(&mut db, dir.path(), "RawAccount", "id,region\n2,north\n");
        import(&mut db, dir.path(), "RawContact", "id\n1\n2\n");

        let results = promote_all(&mut db).unwrap();
        assert_eq!(results.len(), 2);

        let account = results
            .iter()
            .find(|r| match r {
                TablePromotion::Promoted(s) => s.raw_table == "RawAccount",
                TablePromotion::Failed { raw_table, .. } => raw_table == "RawAccount",
            })
            .unwrap();
        assert!(matches!(
            account,
            TablePromotion::Failed {
                kind: ErrorKind::SchemaMismatch,
                ..
            }
        ));

        let contact = results
            .iter()
            .find_map(|r| match r {
                TablePromotion::Promoted(s) if s.raw_table == "RawContact" => Some(s),
                _ => None,
            })
            .unwrap();
        assert_eq!(contact.rows_inserted, 1);
        assert_eq!(contact.staging_total, 2);

        // The failed promotion left its staging table unchanged
        assert_eq!(db.row_count("stgAccount").unwrap(), 1);
    }

    #[test]
    fn test_promote_all_without_raw_tables() {
        let mut db = Database::memory().unwrap();
        assert!(promote_all(&mut db).unwrap().is_empty());
    }
}
