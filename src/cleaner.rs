//! Data cleaning applied between reading and writing
//!
//! Steps run in a fixed order, each toggled by [`ImportSettings`]:
//! header trimming, column name cleaning, name validation, blank row
//! skipping, missing-value fill and duplicate removal.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ImportSettings;
use crate::dataset::{CellValue, Dataset};
use crate::error::ImportError;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Counters reported by [`clean`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanStats {
    /// Headers whose name changed
    pub columns_renamed: usize,
    /// Rows dropped because every cell was empty
    pub empty_rows_removed: usize,
    /// Cells replaced by the fill value
    pub cells_filled: usize,
    /// Rows dropped as duplicates of an earlier row
    pub duplicates_removed: usize,
}

/// Lower-case a header, collapse non-alphanumeric runs to `_`, strip `_` at the ends
pub fn clean_column_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Clean a dataset in place
pub fn clean(dataset: &mut Dataset, settings: &ImportSettings) -> Result<CleanStats, ImportError> {
    let mut stats = CleanStats::default();

    stats.columns_renamed = clean_headers(dataset, settings)?;

    if settings.skip_empty_rows {
        stats.empty_rows_removed = remove_empty_rows(dataset);
    }
    if settings.fill_missing {
        stats.cells_filled = fill_missing(dataset, &settings.missing_fill_value);
    }
    if settings.remove_duplicates {
        stats.duplicates_removed = remove_duplicates(dataset);
    }

    tracing::debug!(
        "Cleaned {}: {} renamed, {} empty rows, {} cells filled, {} duplicates",
        dataset.source.display(),
        stats.columns_renamed,
        stats.empty_rows_removed,
        stats.cells_filled,
        stats.duplicates_removed
    );

    Ok(stats)
}

/// Rewrite header names and check that they stay unique and non-empty
fn clean_headers(dataset: &mut Dataset, settings: &ImportSettings) -> Result<usize, ImportError> {
    let original = dataset.columns.clone();

    let cleaned: Vec<String> = original
        .iter()
        .map(|header| {
            let mut name = header.clone();
            if settings.trim_header_spaces {
                name = WHITESPACE_RUN.replace_all(name.trim(), " ").into_owned();
            }
            if settings.clean_column_names {
                name = clean_column_name(&name);
            }
            name
        })
        .collect();

    // Identifiers resolve case-insensitively in the database
    let mut groups: HashMap<String, Vec<&str>> = HashMap::new();
    for (header, name) in original.iter().zip(&cleaned) {
        if name.trim().is_empty() {
            return Err(ImportError::AmbiguousColumnName {
                name: name.clone(),
                headers: vec![header.clone()],
            });
        }
        groups
            .entry(name.to_lowercase())
            .or_default()
            .push(header.as_str());
    }

    if let Some(name) = cleaned
        .iter()
        .find(|name| groups[&name.to_lowercase()].len() > 1)
    {
        return Err(ImportError::AmbiguousColumnName {
            name: name.clone(),
            headers: groups[&name.to_lowercase()]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        });
    }

    let renamed = original
        .iter()
        .zip(&cleaned)
        .filter(|(before, after)| before != after)
        .count();
    dataset.columns = cleaned;
    Ok(renamed)
}

fn remove_empty_rows(dataset: &mut Dataset) -> usize {
    let before = dataset.rows.len();
    dataset
        .rows
        .retain(|row| !row.iter().all(CellValue::is_missing));
    before - dataset.rows.len()
}

fn fill_missing(dataset: &mut Dataset, fill_value: &str) -> usize {
    let mut filled = 0;
    for cell in dataset.rows.iter_mut().flatten() {
        if cell.is_missing() {
            *cell = CellValue::Text(fill_value.to_string());
            filled += 1;
        }
    }
    filled
}

/// Keep the first occurrence of each distinct row, preserving order
fn remove_duplicates(dataset: &mut Dataset) -> usize {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(dataset.rows.len());
        dataset.rows.iter().map(|row| seen.insert(row)).collect()
    };

    let before = dataset.rows.len();
    dataset.rows = std::mem::take(&mut dataset.rows)
        .into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect();
    before - dataset.rows.len()
}
