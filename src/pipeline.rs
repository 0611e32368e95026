//! Import pipeline
//!
//! Runs reader, cleaner, reconciler and writer once per invocation. A
//! failure at any stage aborts the run before anything is committed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cleaner;
use crate::config::{ImportSettings, load_database_settings, load_import_settings};
use crate::database::Database;
use crate::error::{ErrorKind, ImportError};
use crate::reader::CsvReader;
use crate::reconcile::{WritePlan, reconcile};
use crate::writer;

/// What the writer did to the target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    Created,
    Appended,
    Replaced,
}

impl ImportAction {
    fn from_plan(plan: &WritePlan) -> Self {
        match plan {
            WritePlan::Create { .. } => ImportAction::Created,
            WritePlan::Append { .. } => ImportAction::Appended,
            WritePlan::Replace { .. } => ImportAction::Replaced,
        }
    }
}

impl fmt::Display for ImportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportAction::Created => write!(f, "created"),
            ImportAction::Appended => write!(f, "appended"),
            ImportAction::Replaced => write!(f, "replaced"),
        }
    }
}

/// Statistics from one successful import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Identifier of this run, also attached to its log span
    pub run_id: Uuid,
    /// Target table in its stored spelling
    pub table: String,
    /// CSV file that was imported
    pub source: PathBuf,
    /// Text encoding the file was decoded with
    pub encoding: String,
    pub action: ImportAction,
    /// Data rows in the file
    pub rows_read: usize,
    pub columns_renamed: usize,
    pub empty_rows_skipped: usize,
    pub duplicates_removed: usize,
    pub cells_filled: usize,
    pub rows_written: usize,
    /// Table rows before the write (0 when created)
    pub rows_before: i64,
    pub rows_after: i64,
    /// Table columns the CSV did not provide, stored as null
    pub omitted_columns: Vec<String>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ImportReport {
    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let millis = self.duration.as_millis();
        let secs = self.duration.as_secs();
        if secs == 0 {
            format!("{}ms", millis)
        } else if secs < 60 {
            format!("{}s", secs)
        } else {
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}

/// Structured result of one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImportOutcome {
    Success(ImportReport),
    Failure { kind: ErrorKind, message: String },
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Success(_))
    }

    /// Fold a pipeline result into an outcome
    pub fn from_result(result: Result<ImportReport, ImportError>) -> Self {
        match result {
            Ok(report) => ImportOutcome::Success(report),
            Err(err) => ImportOutcome::Failure {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

/// Import one CSV file into the database
pub fn import_csv(db: &mut Database, settings: &ImportSettings) -> Result<ImportReport, ImportError> {
    settings.validate().map_err(ImportError::InvalidConfig)?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("import", run_id = %run_id, table = %settings.target_table);
    let _guard = span.enter();
    let start = Instant::now();

    tracing::info!(
        "Importing {} ({} on existing table)",
        settings.source_path.display(),
        settings.on_table_exists
    );

    let reader = CsvReader::new().with_delimiter(settings.delimiter);
    let mut dataset = reader.read(&settings.source_path)?;
    let rows_read = dataset.row_count();
    tracing::debug!(
        "Read {} rows, {} columns",
        rows_read,
        dataset.column_count()
    );

    let stats = cleaner::clean(&mut dataset, settings)?;

    let plan = reconcile(
        db,
        &settings.target_table,
        &dataset,
        settings.on_table_exists,
    )?;
    let written = writer::write(db, &plan, &dataset)?;

    let report = ImportReport {
        run_id,
        table: plan.table().to_string(),
        source: settings.source_path.clone(),
        encoding: dataset.encoding.to_string(),
        action: ImportAction::from_plan(&plan),
        rows_read,
        columns_renamed: stats.columns_renamed,
        empty_rows_skipped: stats.empty_rows_removed,
        duplicates_removed: stats.duplicates_removed,
        cells_filled: stats.cells_filled,
        rows_written: written.rows_written,
        rows_before: written.rows_before,
        rows_after: written.rows_after,
        omitted_columns: plan.omitted_columns().to_vec(),
        duration: start.elapsed(),
    };

    tracing::info!(
        "Import {}: {} rows {} ({} -> {})",
        report.table,
        report.rows_written,
        report.action,
        report.rows_before,
        report.rows_after
    );
    Ok(report)
}

/// Run one import and report the outcome instead of an error
pub fn run(db: &mut Database, settings: &ImportSettings) -> ImportOutcome {
    let result = import_csv(db, settings);
    if let Err(err) = &result {
        tracing::warn!("Import into {} failed: {}", settings.target_table, err);
    }
    ImportOutcome::from_result(result)
}

/// Load both settings files, open the existing database and run the import
pub fn run_with_config(database_config: &Path, import_config: &Path) -> ImportOutcome {
    let prepared = load_database_settings(database_config).and_then(|db_settings| {
        let settings = load_import_settings(import_config)?;
        let db = Database::open(db_settings.path())?;
        Ok((db, settings))
    });

    match prepared {
        Ok((mut db, settings)) => run(&mut db, &settings),
        Err(err) => {
            tracing::warn!("Import setup failed: {}", err);
            ImportOutcome::from_result(Err(err))
        }
    }
}
