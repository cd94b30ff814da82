//! Single-statement insert-or-update primitives and key resolution.
//!
//! # Invariants
//! - Every write is one `INSERT ... ON CONFLICT` statement; nothing reads a
//!   row first to decide between insert and update.
//! - The conflict target is the entity business key, so a clash on any
//!   other constraint (including a generated `id`) is a hard error.
//! - Existing ids are never overwritten.
//! - A row whose stored values already match is not updated at all.

use crate::db::DbResult;
use crate::model::id::generate_id;
use crate::schema::naming::quote_ident;
use crate::schema::{EntityDescriptor, EntityKind};
use crate::seed::csv_loader::NormalizedRow;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Result of one base-entity upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(String),
    Updated(String),
    /// The stored row already held every written value; nothing was touched.
    Unchanged(String),
}

impl UpsertOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Inserted(id) | Self::Updated(id) | Self::Unchanged(id) => id,
        }
    }
}

/// Builds the upsert statement for `columns` (which must include `id` and
/// every business-key column).
///
/// Non-key columns are overwritten from `excluded`, but only when at least
/// one of them differs from the stored value; a row with nothing to change is
/// left alone so update triggers do not fire. Without non-key columns the
/// conflict is ignored. In both skipped cases `RETURNING` yields no row.
pub fn build_upsert_sql(descriptor: &EntityDescriptor, columns: &[&str]) -> String {
    let column_list = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let conflict_target = descriptor
        .business_key
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");

    let payload: Vec<String> = columns
        .iter()
        .filter(|column| !descriptor.is_primary_key(column) && !descriptor.is_business_key(column))
        .map(|column| quote_ident(column))
        .collect();
    let conflict_action = if payload.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let assignments = payload
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let changed = payload
            .iter()
            .map(|column| format!("{column} IS NOT excluded.{column}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("DO UPDATE SET {assignments} WHERE {changed}")
    };

    format!(
        "INSERT INTO {table} ({column_list}) VALUES ({placeholders})
         ON CONFLICT ({conflict_target}) {conflict_action}
         RETURNING {id};",
        table = quote_ident(descriptor.table),
        id = quote_ident("id"),
    )
}

/// Looks up the id of the row whose business key matches `row`.
fn find_id_by_business_key(
    conn: &Connection,
    descriptor: &EntityDescriptor,
    row: &NormalizedRow,
) -> rusqlite::Result<String> {
    let condition = descriptor
        .business_key
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{} = ?{}", quote_ident(column), index + 1))
        .collect::<Vec<_>>()
        .join(" AND ");
    let values = descriptor
        .business_key
        .iter()
        .map(|column| row.get(column).map_or(Value::Null, |value| value.to_sql_value()));
    conn.query_row(
        &format!(
            "SELECT {id} FROM {table} WHERE {condition};",
            id = quote_ident("id"),
            table = quote_ident(descriptor.table),
        ),
        params_from_iter(values),
        |found| found.get(0),
    )
}

/// Upserts one normalized base-entity row with a freshly generated id.
pub fn upsert_row(
    conn: &Connection,
    descriptor: &EntityDescriptor,
    row: &NormalizedRow,
) -> rusqlite::Result<UpsertOutcome> {
    let fresh_id = generate_id();
    let mut columns = vec!["id"];
    let mut values = vec![Value::Text(fresh_id.clone())];
    for column in row.present_columns(descriptor) {
        if column == "id" {
            continue;
        }
        columns.push(column);
        if let Some(value) = row.get(column) {
            values.push(value.to_sql_value());
        }
    }

    let sql = build_upsert_sql(descriptor, &columns);
    let stored_id: Option<String> = conn
        .query_row(&sql, params_from_iter(values), |row| row.get(0))
        .optional()?;

    match stored_id {
        Some(id) if id == fresh_id => Ok(UpsertOutcome::Inserted(id)),
        Some(id) => Ok(UpsertOutcome::Updated(id)),
        None => Ok(UpsertOutcome::Unchanged(find_id_by_business_key(
            conn, descriptor, row,
        )?)),
    }
}

/// Outcome of resolving a business-key value to an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a str),
    /// Planned earlier in the same dry run; no id exists yet.
    Pending,
    /// More than one persisted row carries the value.
    Ambiguous,
    Missing,
}

/// Value-to-id lookup over one column of persisted rows.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    ids: HashMap<String, String>,
    ambiguous: BTreeSet<String>,
    pending: HashSet<String>,
}

impl KeyIndex {
    /// Loads `column -> id` for every row of `kind` with a non-null value.
    ///
    /// Values held by more than one row are tracked as ambiguous and never
    /// resolve.
    pub fn load(conn: &Connection, kind: EntityKind, column: &str) -> DbResult<Self> {
        let descriptor = kind.descriptor();
        let mut stmt = conn.prepare(&format!(
            "SELECT {id}, {column} FROM {table} WHERE {column} IS NOT NULL;",
            id = quote_ident("id"),
            column = quote_ident(column),
            table = quote_ident(descriptor.table),
        ))?;
        let mut rows = stmt.query([])?;

        let mut index = Self::default();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let key: String = row.get(1)?;
            if index.ambiguous.contains(&key) {
                continue;
            }
            if index.ids.insert(key.clone(), id).is_some() {
                index.ids.remove(&key);
                index.ambiguous.insert(key);
            }
        }
        Ok(index)
    }

    /// Records a value that a dry run would have written.
    pub fn mark_pending(&mut self, key: impl Into<String>) {
        self.pending.insert(key.into());
    }

    pub fn resolve(&self, key: &str) -> Resolution<'_> {
        if self.ambiguous.contains(key) {
            return Resolution::Ambiguous;
        }
        if let Some(id) = self.ids.get(key) {
            return Resolution::Found(id.as_str());
        }
        if self.pending.contains(key) {
            return Resolution::Pending;
        }
        Resolution::Missing
    }
}

/// Builds a unique `column -> id` map for `kind` from persisted rows.
pub fn key_to_id_map(
    conn: &Connection,
    kind: EntityKind,
    column: &str,
) -> DbResult<HashMap<String, String>> {
    Ok(KeyIndex::load(conn, kind, column)?.ids)
}

#[cfg(test)]
mod tests {
    use super::build_upsert_sql;
    use crate::schema::EntityKind;

    #[test]
    fn upsert_sql_updates_only_changed_non_key_columns() {
        let sql = build_upsert_sql(
            EntityKind::Party.descriptor(),
            &["id", "name", "short_name"],
        );
        assert!(sql.contains("ON CONFLICT (\"name\") DO UPDATE SET \"short_name\" = excluded.\"short_name\""));
        assert!(sql.contains("WHERE \"short_name\" IS NOT excluded.\"short_name\""));
        assert!(!sql.contains("\"id\" = excluded"));
        assert!(!sql.contains("\"name\" = excluded"));
        assert!(sql.contains("RETURNING \"id\""));
    }

    #[test]
    fn upsert_sql_without_payload_ignores_conflict() {
        let sql = build_upsert_sql(EntityKind::Party.descriptor(), &["id", "name"]);
        assert!(sql.contains("ON CONFLICT (\"name\") DO NOTHING"));
        assert!(!sql.contains("DO UPDATE"));
    }
}
