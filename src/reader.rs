//! CSV reader
//!
//! Loads a delimited text file into a [`Dataset`]. The reader is
//! format-only: header tokens are kept verbatim and cleaning happens later.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::dataset::{CellValue, Dataset};
use crate::error::ImportError;

/// CSV reader with encoding detection
#[derive(Debug, Clone)]
pub struct CsvReader {
    /// Field delimiter (default: comma)
    delimiter: u8,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvReader {
    /// Create a reader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read a CSV file into a dataset
    pub fn read(&self, path: &Path) -> Result<Dataset, ImportError> {
        if !path.is_file() {
            return Err(ImportError::SourceNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|e| {
            tracing::warn!("Cannot read {}: {}", path.display(), e);
            ImportError::SourceNotFound(path.to_path_buf())
        })?;

        let (content, encoding) = decode(&bytes);
        tracing::debug!(
            "Decoded {} ({} bytes) as {}",
            path.display(),
            bytes.len(),
            encoding.name()
        );

        let mut dataset = self.parse_content(&content, path)?;
        dataset.source = path.to_path_buf();
        dataset.encoding = encoding.name();
        Ok(dataset)
    }

    /// Parse CSV content; `path` is only used for error messages
    pub fn parse_content(&self, content: &str, path: &Path) -> Result<Dataset, ImportError> {
        let malformed = |reason: String| ImportError::MalformedSource {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| malformed(format!("failed to read header row: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(malformed("missing header row".to_string()));
        }

        let columns: Vec<String> = headers.iter().map(str::to_string).collect();
        {
            let mut seen = HashSet::new();
            for column in &columns {
                if !seen.insert(column.as_str()) {
                    return Err(malformed(format!("duplicate header '{}'", column)));
                }
            }
        }

        let width = columns.len();
        let mut dataset = Dataset::new(columns);

        for result in reader.records() {
            let record = result.map_err(|e| malformed(e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if record.len() > width {
                return Err(malformed(format!(
                    "line {} has {} fields but the header has {}",
                    line,
                    record.len(),
                    width
                )));
            }

            let mut row: Vec<CellValue> = record.iter().map(CellValue::from_field).collect();
            row.resize(width, CellValue::Null);
            dataset.rows.push(row);
        }

        Ok(dataset)
    }
}

/// Read a CSV file with the default reader
pub fn read_csv(path: &Path) -> Result<Dataset, ImportError> {
    CsvReader::new().read(path)
}

/// Decode file bytes: BOM first, then UTF-8, then Windows-1252
fn decode(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (content, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (content, encoding);
    }

    let (content, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    if !had_errors {
        return (content, UTF_8);
    }

    let (content, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (content, WINDOWS_1252)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Dataset, ImportError> {
        CsvReader::new().parse_content(content, Path::new("test.csv"))
    }

    #[test]
    fn test_parse_headers_verbatim() {
        let dataset = parse(" First Name ,Age\nAda,36\n").unwrap();
        assert_eq!(dataset.columns, vec![" First Name ", "Age"]);
        assert_eq!(dataset.row_count(), 1);
        assert_eq!(
            dataset.value(0, " First Name "),
            Some(&CellValue::Text("Ada".to_string()))
        );
        assert_eq!(dataset.value(0, "Age"), Some(&CellValue::Integer(36)));
    }

    #[test]
    fn test_short_rows_are_padded_with_null() {
        let dataset = parse("a,b,c\n1,2\n1\n").unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.rows[0][2], CellValue::Null);
        assert_eq!(dataset.rows[1][1], CellValue::Null);
        assert_eq!(dataset.rows[1][2], CellValue::Null);
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let err = parse("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, ImportError::MalformedSource { .. }));
    }

    #[test]
    fn test_duplicate_headers_are_rejected() {
        let err = parse("a,b,a\n1,2,3\n").unwrap_err();
        assert!(matches!(err, ImportError::MalformedSource { .. }));
    }

    #[test]
    fn test_header_only_yields_zero_rows() {
        let dataset = parse("id,name\n").unwrap();
        assert_eq!(dataset.columns, vec!["id", "name"]);
        assert_eq!(dataset.row_count(), 0);
    }

    #[test]
    fn test_empty_content_is_malformed() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, ImportError::MalformedSource { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_csv(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, ImportError::SourceNotFound(_)));

        // A directory is not a readable file either
        let err = read_csv(dir.path()).unwrap_err();
        assert!(matches!(err, ImportError::SourceNotFound(_)));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin.csv");
        let mut file = File::create(&path).unwrap();
        // "café" encoded as Windows-1252
        file.write_all(b"name\ncaf\xe9\n").unwrap();

        let dataset = read_csv(&path).unwrap();
        assert_eq!(dataset.encoding, "windows-1252");
        assert_eq!(dataset.rows[0][0], CellValue::Text("café".to_string()));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bom.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"\xef\xbb\xbfid,name\n1,x\n").unwrap();

        let dataset = read_csv(&path).unwrap();
        assert_eq!(dataset.encoding, "UTF-8");
        assert_eq!(dataset.columns[0], "id");
        assert_eq!(dataset.source, path);
    }

    #[test]
    fn test_custom_delimiter() {
        let dataset = CsvReader::new()
            .with_delimiter(b';')
            .parse_content("a;b\n1;x\n", Path::new("semi.csv"))
            .unwrap();
        assert_eq!(dataset.columns, vec!["a", "b"]);
        assert_eq!(dataset.rows[0][1], CellValue::Text("x".to_string()));
    }
}
