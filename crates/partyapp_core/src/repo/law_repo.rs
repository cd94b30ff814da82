//! Law repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `T_LAW`.
//! - Leave `created_at`/`updated_at` to the database defaults and trigger.
//!
//! # Invariants
//! - Write paths call `Law::validate()` before SQL mutations.
//! - Deleting a law cascades to role rows and category links only.

use crate::db::ensure_schema_ready;
use crate::model::enums::DbEnum;
use crate::model::law::Law;
use crate::repo::{date_to_db, parse_db_date, parse_db_enum, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const LAW_SELECT_SQL: &str = "SELECT
    id,
    title,
    law_number,
    type,
    jurisdiction,
    promulgated_on,
    enacted_on,
    summary,
    source_url,
    source_hash,
    created_at,
    updated_at
FROM T_LAW";

/// Repository interface for law CRUD operations.
pub trait LawRepository {
    fn create_law(&self, law: &Law) -> RepoResult<String>;
    fn update_law(&self, law: &Law) -> RepoResult<()>;
    fn get_law(&self, id: &str) -> RepoResult<Option<Law>>;
    fn find_law_by_number(&self, law_number: &str) -> RepoResult<Option<Law>>;
    fn list_laws(&self) -> RepoResult<Vec<Law>>;
    fn delete_law(&self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed law repository.
pub struct SqliteLawRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLawRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_one(&self, filter_sql: &str, key: &str) -> RepoResult<Option<Law>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LAW_SELECT_SQL} WHERE {filter_sql};"))?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_law_row(row)?));
        }
        Ok(None)
    }
}

impl LawRepository for SqliteLawRepository<'_> {
    fn create_law(&self, law: &Law) -> RepoResult<String> {
        law.validate()?;

        self.conn.execute(
            "INSERT INTO T_LAW (
                id,
                title,
                law_number,
                type,
                jurisdiction,
                promulgated_on,
                enacted_on,
                summary,
                source_url,
                source_hash
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                law.id.as_str(),
                law.title.as_str(),
                law.law_number.as_deref(),
                law.kind.as_str(),
                law.jurisdiction.as_str(),
                date_to_db(law.promulgated_on),
                date_to_db(law.enacted_on),
                law.summary.as_deref(),
                law.source_url.as_deref(),
                law.source_hash.as_deref(),
            ],
        )?;

        Ok(law.id.clone())
    }

    fn update_law(&self, law: &Law) -> RepoResult<()> {
        law.validate()?;

        let changed = self.conn.execute(
            "UPDATE T_LAW
             SET
                title = ?1,
                law_number = ?2,
                type = ?3,
                jurisdiction = ?4,
                promulgated_on = ?5,
                enacted_on = ?6,
                summary = ?7,
                source_url = ?8,
                source_hash = ?9
             WHERE id = ?10;",
            params![
                law.title.as_str(),
                law.law_number.as_deref(),
                law.kind.as_str(),
                law.jurisdiction.as_str(),
                date_to_db(law.promulgated_on),
                date_to_db(law.enacted_on),
                law.summary.as_deref(),
                law.source_url.as_deref(),
                law.source_hash.as_deref(),
                law.id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "Law",
                key: law.id.clone(),
            });
        }
        Ok(())
    }

    fn get_law(&self, id: &str) -> RepoResult<Option<Law>> {
        self.query_one("id = ?1", id)
    }

    fn find_law_by_number(&self, law_number: &str) -> RepoResult<Option<Law>> {
        self.query_one("law_number = ?1", law_number)
    }

    fn list_laws(&self) -> RepoResult<Vec<Law>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LAW_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut laws = Vec::new();
        while let Some(row) = rows.next()? {
            laws.push(parse_law_row(row)?);
        }
        Ok(laws)
    }

    fn delete_law(&self, id: &str) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM T_LAW WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "Law",
                key: id.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_law_row(row: &Row<'_>) -> RepoResult<Law> {
    let type_text: String = row.get("type")?;
    let jurisdiction_text: String = row.get("jurisdiction")?;

    let law = Law {
        id: row.get("id")?,
        title: row.get("title")?,
        law_number: row.get("law_number")?,
        kind: parse_db_enum(&type_text, "T_LAW.type")?,
        jurisdiction: parse_db_enum(&jurisdiction_text, "T_LAW.jurisdiction")?,
        promulgated_on: parse_db_date(row.get("promulgated_on")?, "T_LAW.promulgated_on")?,
        enacted_on: parse_db_date(row.get("enacted_on")?, "T_LAW.enacted_on")?,
        summary: row.get("summary")?,
        source_url: row.get("source_url")?,
        source_hash: row.get("source_hash")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    law.validate()?;
    Ok(law)
}
