//! Party-law role associations.

use crate::db::ensure_schema_ready;
use crate::model::associations::PartyLawRole;
use crate::model::enums::DbEnum;
use crate::repo::{parse_db_enum, RepoResult};
use rusqlite::{params, Connection, Row};

pub trait PartyLawRoleRepository {
    /// Inserts a role or replaces the note of an existing one.
    fn put_role(&self, role: &PartyLawRole) -> RepoResult<()>;
    fn roles_for_law(&self, law_id: &str) -> RepoResult<Vec<PartyLawRole>>;
    fn roles_for_party(&self, party_id: &str) -> RepoResult<Vec<PartyLawRole>>;
}

pub struct SqlitePartyLawRoleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePartyLawRoleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn collect(&self, filter_column: &str, key: &str) -> RepoResult<Vec<PartyLawRole>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT law_id, party_id, role, note
             FROM T_PARTY_LAW_ROLE
             WHERE {filter_column} = ?1
             ORDER BY law_id ASC, party_id ASC, role ASC;"
        ))?;
        let mut rows = stmt.query([key])?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }
}

impl PartyLawRoleRepository for SqlitePartyLawRoleRepository<'_> {
    fn put_role(&self, role: &PartyLawRole) -> RepoResult<()> {
        role.validate()?;
        self.conn.execute(
            "INSERT INTO T_PARTY_LAW_ROLE (law_id, party_id, role, note)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (law_id, party_id, role) DO UPDATE SET note = excluded.note;",
            params![
                role.law_id.as_str(),
                role.party_id.as_str(),
                role.role.as_str(),
                role.note.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn roles_for_law(&self, law_id: &str) -> RepoResult<Vec<PartyLawRole>> {
        self.collect("law_id", law_id)
    }

    fn roles_for_party(&self, party_id: &str) -> RepoResult<Vec<PartyLawRole>> {
        self.collect("party_id", party_id)
    }
}

fn parse_role_row(row: &Row<'_>) -> RepoResult<PartyLawRole> {
    let role_text: String = row.get("role")?;
    let role = PartyLawRole {
        law_id: row.get("law_id")?,
        party_id: row.get("party_id")?,
        role: parse_db_enum(&role_text, "T_PARTY_LAW_ROLE.role")?,
        note: row.get("note")?,
    };
    role.validate()?;
    Ok(role)
}
