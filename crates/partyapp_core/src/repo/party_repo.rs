//! Party repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `id` is never rewritten by `update_party`.
//! - Deleting a party cascades to its `T_PARTY_LAW_ROLE` rows.

use crate::db::ensure_schema_ready;
use crate::model::party::Party;
use crate::repo::{date_to_db, parse_db_date, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PARTY_SELECT_SQL: &str = "SELECT
    id,
    name,
    short_name,
    founded_on,
    dissolved_on
FROM M_PARTY";

/// Repository interface for party CRUD operations.
pub trait PartyRepository {
    fn create_party(&self, party: &Party) -> RepoResult<String>;
    fn update_party(&self, party: &Party) -> RepoResult<()>;
    fn get_party(&self, id: &str) -> RepoResult<Option<Party>>;
    fn find_party_by_name(&self, name: &str) -> RepoResult<Option<Party>>;
    fn list_parties(&self) -> RepoResult<Vec<Party>>;
    fn delete_party(&self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed party repository.
pub struct SqlitePartyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePartyRepository<'conn> {
    /// Constructs a repository from a connection whose schema is ready.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PartyRepository for SqlitePartyRepository<'_> {
    fn create_party(&self, party: &Party) -> RepoResult<String> {
        party.validate()?;

        self.conn.execute(
            "INSERT INTO M_PARTY (id, name, short_name, founded_on, dissolved_on)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                party.id.as_str(),
                party.name.as_str(),
                party.short_name.as_deref(),
                date_to_db(party.founded_on),
                date_to_db(party.dissolved_on),
            ],
        )?;

        Ok(party.id.clone())
    }

    fn update_party(&self, party: &Party) -> RepoResult<()> {
        party.validate()?;

        let changed = self.conn.execute(
            "UPDATE M_PARTY
             SET
                name = ?1,
                short_name = ?2,
                founded_on = ?3,
                dissolved_on = ?4
             WHERE id = ?5;",
            params![
                party.name.as_str(),
                party.short_name.as_deref(),
                date_to_db(party.founded_on),
                date_to_db(party.dissolved_on),
                party.id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "Party",
                key: party.id.clone(),
            });
        }
        Ok(())
    }

    fn get_party(&self, id: &str) -> RepoResult<Option<Party>> {
        let row = self
            .conn
            .query_row(
                &format!("{PARTY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                read_party_columns,
            )
            .optional()?;
        row.map(into_party).transpose()
    }

    fn find_party_by_name(&self, name: &str) -> RepoResult<Option<Party>> {
        let row = self
            .conn
            .query_row(
                &format!("{PARTY_SELECT_SQL} WHERE name = ?1;"),
                [name],
                read_party_columns,
            )
            .optional()?;
        row.map(into_party).transpose()
    }

    fn list_parties(&self) -> RepoResult<Vec<Party>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARTY_SELECT_SQL} ORDER BY name ASC;"))?;
        let rows = stmt.query_map([], read_party_columns)?;
        let mut parties = Vec::new();
        for row in rows {
            parties.push(into_party(row?)?);
        }
        Ok(parties)
    }

    fn delete_party(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM M_PARTY WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "Party",
                key: id.to_string(),
            });
        }
        Ok(())
    }
}

type PartyColumns = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn read_party_columns(row: &Row<'_>) -> rusqlite::Result<PartyColumns> {
    Ok((
        row.get("id")?,
        row.get("name")?,
        row.get("short_name")?,
        row.get("founded_on")?,
        row.get("dissolved_on")?,
    ))
}

fn into_party(columns: PartyColumns) -> RepoResult<Party> {
    let (id, name, short_name, founded_on, dissolved_on) = columns;
    let party = Party {
        id,
        name,
        short_name,
        founded_on: parse_db_date(founded_on, "M_PARTY.founded_on")?,
        dissolved_on: parse_db_date(dissolved_on, "M_PARTY.dissolved_on")?,
    };
    party.validate()?;
    Ok(party)
}
