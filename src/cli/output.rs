//! Output formatting for CLI

use crate::database::TableSummary;
use crate::pipeline::ImportReport;
use crate::promote::TablePromotion;

/// Format an import report, followed by a preview of the table's last rows
pub fn format_import_report(report: &ImportReport, columns: &[String], preview: &[Vec<String>]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n✅ Table '{}' {} from {}\n",
        report.table,
        report.action,
        report.source.display()
    ));
    output.push_str(&format!("  Run ID: {}\n", report.run_id));
    output.push_str(&format!("  Encoding: {}\n", report.encoding));
    output.push_str(&format!("  Rows read: {}\n", report.rows_read));
    if report.columns_renamed > 0 {
        output.push_str(&format!("  Columns renamed: {}\n", report.columns_renamed));
    }
    if report.empty_rows_skipped > 0 {
        output.push_str(&format!("  Empty rows skipped: {}\n", report.empty_rows_skipped));
    }
    output.push_str(&format!("  Duplicates removed: {}\n", report.duplicates_removed));
    output.push_str(&format!("  Cells filled: {}\n", report.cells_filled));
    output.push_str(&format!("  Rows written: {}\n", report.rows_written));
    output.push_str(&format!(
        "  Table rows: {} -> {}\n",
        report.rows_before, report.rows_after
    ));
    output.push_str(&format!("  Duration: {}\n", report.duration_string()));

    if !report.omitted_columns.is_empty() {
        output.push_str(&format!(
            "\n⚠️  Columns not in the CSV (stored as NULL): {}\n",
            report.omitted_columns.join(", ")
        ));
    }

    if !preview.is_empty() {
        output.push_str(&format!("\nLast {} row(s):\n", preview.len()));
        output.push_str(&format!("  {}\n", columns.join(" | ")));
        for row in preview {
            output.push_str(&format!("  {}\n", row.join(" | ")));
        }
    }

    output
}

/// Format the list of user tables
pub fn format_table_list(tables: &[TableSummary]) -> String {
    if tables.is_empty() {
        return "No tables found.\n".to_string();
    }

    let width = tables.iter().map(|t| t.name.len()).max().unwrap_or(0);
    let mut output = format!("{} table(s):\n", tables.len());
    for table in tables {
        output.push_str(&format!(
            "  {:<width$}  {} row(s)\n",
            table.name,
            table.row_count,
            width = width
        ));
    }
    output
}

/// Format promotion results with a summary
pub fn format_promotions(results: &[TablePromotion]) -> String {
    if results.is_empty() {
        return "\n⚠️  No raw tables found. Raw tables start with 'raw' (e.g. RawAccount, rawCustomers).\n"
            .to_string();
    }

    let mut output = String::new();
    let mut inserted = 0;
    let mut duplicates = 0;
    let mut failed = 0;

    for result in results {
        match result {
            TablePromotion::Promoted(stats) => {
                inserted += stats.rows_inserted;
                duplicates += stats.duplicates_in_raw;
                output.push_str(&format!(
                    "\n✅ {} -> {}\n",
                    stats.raw_table, stats.staging_table
                ));
                output.push_str(&format!("  Rows in raw table: {}\n", stats.raw_rows));
                output.push_str(&format!("  Duplicates removed: {}\n", stats.duplicates_in_raw));
                output.push_str(&format!("  Already staged: {}\n", stats.already_staged));
                output.push_str(&format!("  New rows inserted: {}\n", stats.rows_inserted));
                output.push_str(&format!("  Total in staging: {}\n", stats.staging_total));
            }
            TablePromotion::Failed {
                raw_table,
                staging_table,
                kind,
                message,
            } => {
                failed += 1;
                output.push_str(&format!("\n❌ {} -> {}\n", raw_table, staging_table));
                output.push_str(&format!("  [{}] {}\n", kind, message));
            }
        }
    }

    output.push_str(&format!(
        "\nProcessed {} table(s): {} succeeded, {} failed\n",
        results.len(),
        results.len() - failed,
        failed
    ));
    output.push_str(&format!("Total new rows inserted: {}\n", inserted));
    output.push_str(&format!("Total duplicates removed: {}\n", duplicates));
    output
}
