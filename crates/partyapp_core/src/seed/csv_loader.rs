//! CSV input reading and field normalization.
//!
//! # Responsibility
//! - Read one seed file into ordered rows keyed by header name.
//! - Turn raw strings into typed field values per declared column type.
//!
//! # Invariants
//! - A missing file is a warning and yields no rows.
//! - Empty fields are absent (`None`), never empty strings.
//! - An input `id` column is always dropped.
//! - `Date` columns accept exactly `YYYY-MM-DD`.

use crate::repo::DATE_FORMAT;
use crate::schema::{ColumnType, EntityDescriptor};
use chrono::NaiveDate;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Column that is never read from input files.
pub const IGNORED_ID_COLUMN: &str = "id";

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug)]
pub enum LoadError {
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    InvalidDate {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    UnknownColumn {
        path: PathBuf,
        entity: &'static str,
        column: String,
    },
    ReadOnlyColumn {
        path: PathBuf,
        entity: &'static str,
        column: String,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv { path, .. } => write!(f, "failed to read {}", path.display()),
            Self::InvalidDate {
                path,
                line,
                column,
                value,
            } => write!(
                f,
                "{}:{line}: column `{column}` value `{value}` is not a YYYY-MM-DD date",
                path.display()
            ),
            Self::UnknownColumn {
                path,
                entity,
                column,
            } => write!(
                f,
                "{}: column `{column}` is not defined for {entity}",
                path.display()
            ),
            Self::ReadOnlyColumn {
                path,
                entity,
                column,
            } => write!(
                f,
                "{}: column `{column}` of {entity} is assigned by the database",
                path.display()
            ),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One data row as read from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line in the source file.
    pub line: u64,
    /// Header name to raw cell text; `id` already removed.
    pub fields: BTreeMap<String, String>,
}

impl SourceRow {
    /// Returns the trimmed value of `column`, treating empty as absent.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|value| value.as_str())
            .filter(|value| !value.is_empty())
    }
}

/// Typed cell value ready for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Date(date) => date.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn to_sql_value(&self) -> Value {
        Value::Text(self.as_text())
    }
}

/// A base-entity row after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub line: u64,
    /// Column name to value; `None` for empty input cells.
    pub values: BTreeMap<&'static str, Option<FieldValue>>,
}

impl NormalizedRow {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column).and_then(|value| value.as_ref())
    }

    /// Columns with a non-null value, in descriptor order.
    pub fn present_columns(&self, descriptor: &EntityDescriptor) -> Vec<&'static str> {
        descriptor
            .columns
            .iter()
            .map(|column| column.name)
            .filter(|name| self.get(name).is_some())
            .collect()
    }

    /// Human-readable business key, e.g. `name=Alpha`.
    pub fn describe_key(&self, descriptor: &EntityDescriptor) -> String {
        descriptor
            .business_key
            .iter()
            .map(|key| {
                let value = self
                    .get(key)
                    .map(FieldValue::as_text)
                    .unwrap_or_else(|| "<null>".to_string());
                format!("{key}={value}")
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Reads all rows of a CSV file with a header line.
pub fn read_rows(path: &Path) -> LoadResult<Vec<SourceRow>> {
    if !path.exists() {
        warn!(
            "event=seed_file module=seed status=skipped reason=missing_file path={}",
            path.display()
        );
        return Ok(Vec::new());
    }

    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map_or(0, |position| position.line());
        let fields = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| header.as_str() != IGNORED_ID_COLUMN)
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        rows.push(SourceRow { line, fields });
    }

    debug!(
        "event=seed_file module=seed status=read path={} rows={}",
        path.display(),
        rows.len()
    );
    Ok(rows)
}

/// Converts a raw row into typed values for `descriptor`.
///
/// # Errors
/// - `UnknownColumn` for headers the entity does not declare.
/// - `ReadOnlyColumn` for server-assigned columns.
/// - `InvalidDate` for malformed values in `Date` columns.
pub fn normalize_row(
    descriptor: &EntityDescriptor,
    path: &Path,
    row: &SourceRow,
) -> LoadResult<NormalizedRow> {
    let mut values = BTreeMap::new();

    for (name, raw) in &row.fields {
        let column = descriptor
            .column(name)
            .ok_or_else(|| LoadError::UnknownColumn {
                path: path.to_path_buf(),
                entity: descriptor.name,
                column: name.clone(),
            })?;
        if !column.is_writable() {
            return Err(LoadError::ReadOnlyColumn {
                path: path.to_path_buf(),
                entity: descriptor.name,
                column: name.clone(),
            });
        }

        let value = if raw.is_empty() {
            None
        } else if column.ty == ColumnType::Date {
            Some(FieldValue::Date(parse_date(raw).ok_or_else(|| {
                LoadError::InvalidDate {
                    path: path.to_path_buf(),
                    line: row.line,
                    column: name.clone(),
                    value: raw.clone(),
                }
            })?))
        } else {
            Some(FieldValue::Text(raw.clone()))
        };
        values.insert(column.name, value);
    }

    Ok(NormalizedRow {
        line: row.line,
        values,
    })
}

/// Parses exactly `YYYY-MM-DD` into a calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if !DATE_RE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::parse_date;
    use chrono::NaiveDate;

    #[test]
    fn parse_date_requires_exact_shape() {
        assert_eq!(
            parse_date("2024-03-09"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
        assert_eq!(parse_date("2024-3-9"), None);
        assert_eq!(parse_date("2024/03/09"), None);
        assert_eq!(parse_date("2024-03-09T00:00"), None);
    }

    #[test]
    fn parse_date_rejects_impossible_dates() {
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }
}
