//! Ad hoc filtered, ordered, bounded reads for inspection.
//!
//! # Responsibility
//! - Validate a view request against the static entity registry.
//! - Build and run one parameterized `SELECT`.
//!
//! # Invariants
//! - Every entity/column name and filter value is validated by `plan_view`
//!   before any SQL is prepared; a bad request has no side effects.
//! - Filter values are parsed by the column's declared type, never guessed.
//! - Identifiers in SQL come from descriptors only; user values are bound.

use crate::db::{ensure_schema_ready, DbError};
use crate::model::id::is_valid_id;
use crate::schema::naming::quote_ident;
use crate::schema::{ColumnDef, ColumnType, EntityKind, SchemaError};
use crate::seed::csv_loader::parse_date;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rows returned when no limit is given.
pub const DEFAULT_VIEW_LIMIT: u32 = 20;

static FILTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=(.*)$").expect("valid filter regex")
});

pub type ViewResult<T> = Result<T, ViewError>;

#[derive(Debug)]
pub enum ViewError {
    Schema(SchemaError),
    /// Filter is not of the form `column=value`.
    InvalidFilter(String),
    InvalidFilterValue {
        column: &'static str,
        value: String,
        expected: String,
    },
    InvalidLimit(u32),
    Db(DbError),
}

impl Display for ViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::InvalidFilter(expression) => write!(
                f,
                "invalid filter `{expression}`; expected column=value"
            ),
            Self::InvalidFilterValue {
                column,
                value,
                expected,
            } => write!(
                f,
                "invalid value `{value}` for column `{column}`; expected {expected}"
            ),
            Self::InvalidLimit(limit) => write!(f, "limit must be at least 1, got {limit}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ViewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => err.source(),
            Self::Db(err) => err.source(),
            _ => None,
        }
    }
}

impl From<SchemaError> for ViewError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<DbError> for ViewError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ViewError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw view request as given by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub entity: String,
    /// Projection; empty selects every column.
    pub columns: Vec<String>,
    /// `column=value` expressions combined with AND.
    pub filters: Vec<String>,
    /// Defaults to the entity's first primary-key column.
    pub order_by: Option<String>,
    pub descending: bool,
    pub limit: u32,
}

impl ViewQuery {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order_by: None,
            descending: false,
            limit: DEFAULT_VIEW_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Equals(Value),
    IsNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: FilterValue,
}

/// Validated view request.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPlan {
    pub entity: EntityKind,
    pub columns: Vec<&'static str>,
    pub filters: Vec<Filter>,
    pub order_by: &'static str,
    pub descending: bool,
    pub limit: u32,
}

impl ViewPlan {
    /// Returns the statement and its bound values.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let descriptor = self.entity.descriptor();
        let projection = self
            .columns
            .iter()
            .map(|column| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "SELECT {projection} FROM {}",
            quote_ident(descriptor.table)
        );
        let mut bind_values = Vec::new();

        let mut conditions = Vec::new();
        for filter in &self.filters {
            match &filter.value {
                FilterValue::Equals(value) => {
                    bind_values.push(value.clone());
                    conditions.push(format!(
                        "{} = ?{}",
                        quote_ident(filter.column),
                        bind_values.len()
                    ));
                }
                FilterValue::IsNull => {
                    conditions.push(format!("{} IS NULL", quote_ident(filter.column)));
                }
            }
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(&format!(
            " ORDER BY {} {}",
            quote_ident(self.order_by),
            if self.descending { "DESC" } else { "ASC" }
        ));
        bind_values.push(Value::Integer(i64::from(self.limit)));
        sql.push_str(&format!(" LIMIT ?{};", bind_values.len()));

        (sql, bind_values)
    }
}

/// Query result with column order preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    pub entity: EntityKind,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// JSON array with one object per row.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.to_string(), value_to_json(value)))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    /// Cell text for tabular output; `NULL` for absent values.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(display_value).collect())
            .collect()
    }
}

/// Validates a request without touching the database.
pub fn plan_view(query: &ViewQuery) -> ViewResult<ViewPlan> {
    let entity = EntityKind::from_name(&query.entity)?;
    let descriptor = entity.descriptor();

    let columns = if query.columns.is_empty() {
        descriptor.column_names()
    } else {
        query
            .columns
            .iter()
            .map(|name| descriptor.require_column(name.trim()).map(|column| column.name))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut filters = Vec::with_capacity(query.filters.len());
    for expression in &query.filters {
        let captures = FILTER_RE
            .captures(expression)
            .ok_or_else(|| ViewError::InvalidFilter(expression.clone()))?;
        let column = descriptor.require_column(&captures[1])?;
        let value = parse_filter_value(column, captures[2].trim())?;
        filters.push(Filter {
            column: column.name,
            value,
        });
    }

    let order_by = match &query.order_by {
        Some(name) => descriptor.require_column(name.trim())?.name,
        None => descriptor.default_order_column(),
    };

    if query.limit == 0 {
        return Err(ViewError::InvalidLimit(query.limit));
    }

    Ok(ViewPlan {
        entity,
        columns,
        filters,
        order_by,
        descending: query.descending,
        limit: query.limit,
    })
}

/// Executes a validated plan.
pub fn run_view(conn: &Connection, plan: &ViewPlan) -> ViewResult<RecordSet> {
    ensure_schema_ready(conn)?;
    let (sql, bind_values) = plan.to_sql();
    debug!(
        "event=view_query module=viewer status=start entity={} filters={} limit={}",
        plan.entity,
        plan.filters.len(),
        plan.limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(plan.columns.len());
        for index in 0..plan.columns.len() {
            record.push(row.get::<_, Value>(index)?);
        }
        records.push(record);
    }

    Ok(RecordSet {
        entity: plan.entity,
        columns: plan.columns.clone(),
        rows: records,
    })
}

/// Plans and runs a request in one call.
pub fn view_records(conn: &Connection, query: &ViewQuery) -> ViewResult<RecordSet> {
    let plan = plan_view(query)?;
    run_view(conn, &plan)
}

fn parse_filter_value(column: &'static ColumnDef, raw: &str) -> ViewResult<FilterValue> {
    let invalid = |expected: String| ViewError::InvalidFilterValue {
        column: column.name,
        value: raw.to_string(),
        expected,
    };

    if raw.is_empty() {
        if column.nullable {
            return Ok(FilterValue::IsNull);
        }
        return Err(invalid("a value (column is not nullable)".to_string()));
    }

    let text = match column.ty {
        ColumnType::Id => {
            if !is_valid_id(raw) {
                return Err(invalid("an 18-character record id".to_string()));
            }
            raw.to_string()
        }
        ColumnType::Date => match parse_date(raw) {
            Some(_) => raw.to_string(),
            None => return Err(invalid("a YYYY-MM-DD date".to_string())),
        },
        ColumnType::Enum { name, values } => {
            if !values.contains(&raw) {
                return Err(invalid(format!("a {name} ({})", values.join("|"))));
            }
            raw.to_string()
        }
        ColumnType::Text { .. } | ColumnType::Timestamp => raw.to_string(),
    };
    Ok(FilterValue::Equals(Value::Text(text)))
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(number) => serde_json::Value::from(*number),
        Value::Real(number) => serde_json::Value::from(*number),
        Value::Text(text) => serde_json::Value::String(text.clone()),
        Value::Blob(bytes) => serde_json::Value::String(format!("<{} bytes>", bytes.len())),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::{plan_view, FilterValue, ViewError, ViewQuery};
    use crate::schema::SchemaError;
    use rusqlite::types::Value;

    #[test]
    fn plan_defaults_to_all_columns_and_id_order() {
        let plan = plan_view(&ViewQuery::new("Party")).unwrap();
        assert_eq!(
            plan.columns,
            vec!["id", "name", "short_name", "founded_on", "dissolved_on"]
        );
        assert_eq!(plan.order_by, "id");
    }

    #[test]
    fn filters_are_parsed_by_declared_type() {
        let mut query = ViewQuery::new("Law");
        query.filters = vec![
            "type=statute".to_string(),
            "enacted_on=2020-04-01".to_string(),
            "law_number=".to_string(),
        ];
        let plan = plan_view(&query).unwrap();
        assert_eq!(
            plan.filters[0].value,
            FilterValue::Equals(Value::Text("statute".to_string()))
        );
        assert_eq!(plan.filters[2].value, FilterValue::IsNull);

        let (sql, values) = plan.to_sql();
        assert!(sql.contains("\"type\" = ?1 AND \"enacted_on\" = ?2 AND \"law_number\" IS NULL"));
        assert!(sql.ends_with("LIMIT ?3;"));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn ambiguous_values_are_rejected() {
        let mut query = ViewQuery::new("Law");
        query.filters = vec!["enacted_on=20200401".to_string()];
        assert!(matches!(
            plan_view(&query),
            Err(ViewError::InvalidFilterValue { column: "enacted_on", .. })
        ));

        query.filters = vec!["type=Statute".to_string()];
        assert!(matches!(
            plan_view(&query),
            Err(ViewError::InvalidFilterValue { column: "type", .. })
        ));

        query.filters = vec!["title=".to_string()];
        assert!(matches!(
            plan_view(&query),
            Err(ViewError::InvalidFilterValue { column: "title", .. })
        ));
    }

    #[test]
    fn malformed_filter_and_unknown_columns_fail() {
        let mut query = ViewQuery::new("Party");
        query.filters = vec!["name~Alpha".to_string()];
        assert!(matches!(plan_view(&query), Err(ViewError::InvalidFilter(_))));

        let mut query = ViewQuery::new("Party");
        query.order_by = Some("popularity".to_string());
        assert!(matches!(
            plan_view(&query),
            Err(ViewError::Schema(SchemaError::UnknownColumn { .. }))
        ));

        let mut query = ViewQuery::new("Party");
        query.limit = 0;
        assert!(matches!(plan_view(&query), Err(ViewError::InvalidLimit(0))));
    }
}
