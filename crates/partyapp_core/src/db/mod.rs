//! SQLite storage bootstrap and schema lifecycle entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Create, inspect and drop the application schema.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Every returned connection enforces foreign keys.
//! - Application data is not read or written before the schema is at the
//!   latest version (`ensure_schema_ready`).

use crate::schema::naming::quote_ident;
use crate::schema::EntityKind;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_existing_db};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    SchemaNotReady {
        db_version: u32,
        expected: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotReady {
                db_version,
                expected,
            } => write!(
                f,
                "database schema version {db_version} does not match expected {expected}; run `schema create` first"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            // Displayed transparently, so the chain continues below it.
            Self::Sqlite(err) => err.source(),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Snapshot of schema state for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatus {
    pub db_version: u32,
    pub latest_version: u32,
    /// `(entity, table present)` in dependency order.
    pub tables: Vec<(EntityKind, bool)>,
}

impl SchemaStatus {
    pub fn is_ready(&self) -> bool {
        self.db_version == self.latest_version && self.tables.iter().all(|(_, present)| *present)
    }
}

/// Creates all tables by applying pending migrations. Idempotent.
pub fn create_schema(conn: &mut Connection) -> DbResult<u32> {
    migrations::apply_migrations(conn)?;
    let version = migrations::current_version(conn)?;
    info!("event=schema_create module=db status=ok version={version}");
    Ok(version)
}

/// Drops every application table and resets the schema version.
pub fn drop_schema(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(&crate::schema::ddl::drop_schema_sql())?;
    tx.execute_batch("PRAGMA user_version = 0;")?;
    tx.commit()?;
    info!("event=schema_drop module=db status=ok");
    Ok(())
}

pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    let mut tables = Vec::with_capacity(EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        tables.push((kind, table_exists(conn, kind.table())?));
    }
    Ok(SchemaStatus {
        db_version: migrations::current_version(conn)?,
        latest_version: migrations::latest_version(),
        tables,
    })
}

/// Fails unless the schema is exactly at the latest version.
pub fn ensure_schema_ready(conn: &Connection) -> DbResult<()> {
    let db_version = migrations::current_version(conn)?;
    let latest = migrations::latest_version();
    if db_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported: latest,
        });
    }
    if db_version != latest {
        return Err(DbError::SchemaNotReady {
            db_version,
            expected: latest,
        });
    }
    Ok(())
}

/// Connection probe; returns the SQLite library version.
pub fn ping(conn: &Connection) -> DbResult<String> {
    let version = conn.query_row("SELECT sqlite_version();", [], |row| row.get(0))?;
    Ok(version)
}

pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Counts rows of one entity table.
pub fn count_rows(conn: &Connection, kind: EntityKind) -> DbResult<i64> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {};", quote_ident(kind.table())),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
