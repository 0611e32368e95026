//! In-memory tabular dataset produced from one CSV file

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use duckdb::types::Value;

/// A single scalar cell
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Integer(i64),
    /// Decimal number; `value` is always finite and `raw` is the text it was parsed from
    Real { value: f64, raw: String },
    Text(String),
}

impl CellValue {
    /// Infer a typed value from raw CSV text
    ///
    /// Integers are only recognized when they render back to the same text,
    /// so identifiers such as `007` stay text.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Null;
        }
        if let Ok(n) = field.parse::<i64>() {
            if n.to_string() == field {
                return CellValue::Integer(n);
            }
            return CellValue::Text(field.to_string());
        }
        if looks_like_float(field) {
            if let Ok(value) = field.parse::<f64>() {
                if value.is_finite() {
                    return CellValue::Real {
                        value,
                        raw: field.to_string(),
                    };
                }
            }
        }
        CellValue::Text(field.to_string())
    }

    /// Null or empty text
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Value to bind for a column of `sql_type`
    ///
    /// Decimal cells keep their source text unless the column is floating
    /// point, and are rejected by integer columns.
    pub fn bind_value(&self, sql_type: &str) -> Result<Value, String> {
        let value = match self {
            CellValue::Null => Value::Null,
            CellValue::Integer(n) => Value::BigInt(*n),
            CellValue::Real { value, raw } => {
                let sql_type = sql_type.to_ascii_uppercase();
                if is_integer_type(&sql_type) {
                    return Err(format!("non-integer value '{}' for {}", raw, sql_type));
                }
                if matches!(sql_type.as_str(), "DOUBLE" | "FLOAT" | "REAL") {
                    Value::Double(*value)
                } else {
                    Value::Text(raw.clone())
                }
            }
            CellValue::Text(s) => Value::Text(s.clone()),
        };
        Ok(value)
    }
}

fn is_integer_type(sql_type: &str) -> bool {
    matches!(
        sql_type,
        "TINYINT"
            | "SMALLINT"
            | "INTEGER"
            | "BIGINT"
            | "HUGEINT"
            | "UTINYINT"
            | "USMALLINT"
            | "UINTEGER"
            | "UBIGINT"
            | "UHUGEINT"
    )
}

fn looks_like_float(field: &str) -> bool {
    let digits = field.trim_start_matches(['+', '-']);
    let mantissa = digits.split(['e', 'E']).next().unwrap_or("");
    mantissa.chars().any(|c| c.is_ascii_digit())
        && !mantissa.starts_with("00")
        && field.contains(['.', 'e', 'E'])
        && field
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Integer(a), CellValue::Integer(b)) => a == b,
            (CellValue::Real { raw: a, .. }, CellValue::Real { raw: b, .. }) => a == b,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Null => {}
            CellValue::Integer(n) => n.hash(state),
            CellValue::Real { raw, .. } => raw.hash(state),
            CellValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Real { raw, .. } => f.write_str(raw),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Storage type chosen for a new column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Double,
    Varchar,
}

impl ColumnType {
    /// SQL type name
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Varchar => "VARCHAR",
        }
    }
}

/// Column name plus storage type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// Ordered rows of named-column values
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Column names in file order
    pub columns: Vec<String>,
    /// Rows, each aligned with `columns`
    pub rows: Vec<Vec<CellValue>>,
    /// File the rows were read from
    pub source: PathBuf,
    /// Name of the text encoding the file was decoded with
    pub encoding: &'static str,
}

impl Dataset {
    /// Create a dataset with columns and no rows
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            source: PathBuf::new(),
            encoding: "UTF-8",
        }
    }

    /// Build a dataset from literal rows
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows,
            ..Self::new(columns)
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `row` for column `name`
    pub fn value(&self, row: usize, name: &str) -> Option<&CellValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Infer a storage type per column from the non-null values
    pub fn infer_column_defs(&self) -> Vec<ColumnDef> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut saw_value = false;
                let mut all_integer = true;
                let mut all_numeric = true;
                for row in &self.rows {
                    match row.get(idx).unwrap_or(&CellValue::Null) {
                        CellValue::Null => continue,
                        CellValue::Integer(_) => {}
                        CellValue::Real { .. } => all_integer = false,
                        CellValue::Text(_) => {
                            all_integer = false;
                            all_numeric = false;
                        }
                    }
                    saw_value = true;
                }

                let column_type = if !saw_value {
                    ColumnType::Varchar
                } else if all_integer {
                    ColumnType::BigInt
                } else if all_numeric {
                    ColumnType::Double
                } else {
                    ColumnType::Varchar
                };

                ColumnDef {
                    name: name.clone(),
                    column_type,
                }
            })
            .collect()
    }
}
