//! Embedded database handle
//!
//! A [`Database`] owns the single DuckDB connection used by one invocation.
//! Creation is idempotent: an existing file is opened, never truncated, and
//! the `_database_metadata` table is only seeded with entries it lacks.

pub mod catalog;
pub mod schema;

use std::path::{Path, PathBuf};

use duckdb::Connection;
use serde::{Deserialize, Serialize};

use crate::config::DatabaseSettings;
use crate::error::ImportError;

pub use catalog::TableColumn;
pub use schema::{MetadataSchema, quote_identifier};

/// Value recorded under `created_by` in a fresh database
pub const CREATED_BY: &str = concat!("table-importer ", env!("CARGO_PKG_VERSION"));

/// Name and size of a user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub name: String,
    pub row_count: i64,
}

/// Single connection to one database file
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Create the database described by `settings`, or open it if it exists
    pub fn create(settings: &DatabaseSettings) -> Result<Self, ImportError> {
        let path = settings.path();
        let existed = path.exists();
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.init_metadata(&settings.name, settings.description.as_deref())?;

        if existed {
            tracing::info!("Opened existing database {}", path.display());
        } else {
            tracing::info!("Created database {}", path.display());
        }
        Ok(db)
    }

    /// Open an existing database file
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        if !path.is_file() {
            return Err(ImportError::DatabaseNotFound(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Opened database {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn memory() -> Result<Self, ImportError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Get the database path (if not in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the metadata table and seed identity entries that are missing
    pub fn init_metadata(&self, name: &str, description: Option<&str>) -> Result<(), ImportError> {
        self.conn.execute_batch(&MetadataSchema::create_table())?;

        let now = schema::metadata_timestamp();
        let seeds = [
            ("database_name", name),
            ("created_by", CREATED_BY),
            ("description", description.unwrap_or("")),
        ];
        let mut stmt = self.conn.prepare(&MetadataSchema::insert_if_absent())?;
        for (key, value) in seeds {
            stmt.execute([key, value, now.as_str()])?;
        }
        Ok(())
    }

    /// Check if the metadata table exists
    pub fn has_metadata_table(&self) -> Result<bool, ImportError> {
        Ok(catalog::has_metadata_table(&self.conn)?)
    }

    /// Look up a metadata entry
    pub fn metadata(&self, key: &str) -> Result<Option<String>, ImportError> {
        Ok(catalog::metadata_value(&self.conn, key)?)
    }

    /// Stored name of a table, matched case-insensitively
    pub fn find_table(&self, name: &str) -> Result<Option<String>, ImportError> {
        Ok(catalog::find_table(&self.conn, name)?)
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> Result<bool, ImportError> {
        Ok(self.find_table(name)?.is_some())
    }

    /// Columns of a table in declaration order
    pub fn table_columns(&self, table: &str) -> Result<Vec<TableColumn>, ImportError> {
        let stored = self.resolve(table)?;
        Ok(catalog::table_columns(&self.conn, &stored)?)
    }

    /// Row count of a table
    pub fn row_count(&self, table: &str) -> Result<i64, ImportError> {
        let stored = self.resolve(table)?;
        Ok(catalog::row_count(&self.conn, &stored)?)
    }

    /// All user tables with their row counts
    pub fn list_tables(&self) -> Result<Vec<TableSummary>, ImportError> {
        let mut tables = Vec::new();
        for name in catalog::table_names(&self.conn)? {
            let row_count = catalog::row_count(&self.conn, &name)?;
            tables.push(TableSummary { name, row_count });
        }
        Ok(tables)
    }

    /// Last `limit` rows of a table rendered as text
    pub fn tail_rows(&self, table: &str, limit: usize) -> Result<Vec<Vec<String>>, ImportError> {
        let stored = self.resolve(table)?;
        Ok(catalog::tail_rows(&self.conn, &stored, limit)?)
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a unit of work; dropping it without commit rolls back
    pub(crate) fn transaction(&mut self) -> Result<duckdb::Transaction<'_>, ImportError> {
        Ok(self.conn.transaction()?)
    }

    fn resolve(&self, table: &str) -> Result<String, ImportError> {
        self.find_table(table)?
            .ok_or_else(|| ImportError::Database(format!("Table not found: {}", table)))
    }
}
