//! Category repository and law-category links.
//!
//! # Invariants
//! - At most one category row exists per `CategoryType`.
//! - Linking is idempotent: relinking an existing pair is a no-op.

use crate::db::ensure_schema_ready;
use crate::model::associations::LawCategoryMap;
use crate::model::category::Category;
use crate::model::enums::{CategoryType, DbEnum};
use crate::repo::{parse_db_enum, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

pub trait CategoryRepository {
    fn create_category(&self, category: &Category) -> RepoResult<String>;
    fn find_category(&self, name: CategoryType) -> RepoResult<Option<Category>>;
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    /// Links a law to a category; returns whether a new link was created.
    fn link_law(&self, link: &LawCategoryMap) -> RepoResult<bool>;
    fn unlink_law(&self, link: &LawCategoryMap) -> RepoResult<()>;
    /// Categories of one law, ordered by name.
    fn categories_for_law(&self, law_id: &str) -> RepoResult<Vec<Category>>;
}

pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn collect(&self, sql: &str, key: Option<&str>) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match key {
            Some(key) => stmt.query([key])?,
            None => stmt.query([])?,
        };
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, category: &Category) -> RepoResult<String> {
        category.validate()?;
        self.conn.execute(
            "INSERT INTO M_CATEGORY (id, name, description) VALUES (?1, ?2, ?3);",
            params![
                category.id.as_str(),
                category.name.as_str(),
                category.description.as_deref(),
            ],
        )?;
        Ok(category.id.clone())
    }

    fn find_category(&self, name: CategoryType) -> RepoResult<Option<Category>> {
        let mut found = self.collect(
            "SELECT id, name, description FROM M_CATEGORY WHERE name = ?1;",
            Some(name.as_str()),
        )?;
        Ok(found.pop())
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        self.collect(
            "SELECT id, name, description FROM M_CATEGORY ORDER BY name ASC;",
            None,
        )
    }

    fn link_law(&self, link: &LawCategoryMap) -> RepoResult<bool> {
        link.validate()?;
        let inserted = self.conn.execute(
            "INSERT INTO T_LAW_CATEGORY_MAP (law_id, category_id)
             VALUES (?1, ?2)
             ON CONFLICT (law_id, category_id) DO NOTHING;",
            params![link.law_id.as_str(), link.category_id.as_str()],
        )?;
        Ok(inserted == 1)
    }

    fn unlink_law(&self, link: &LawCategoryMap) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM T_LAW_CATEGORY_MAP WHERE law_id = ?1 AND category_id = ?2;",
            params![link.law_id.as_str(), link.category_id.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "LawCategoryMap",
                key: format!("{}/{}", link.law_id, link.category_id),
            });
        }
        Ok(())
    }

    fn categories_for_law(&self, law_id: &str) -> RepoResult<Vec<Category>> {
        self.collect(
            "SELECT c.id, c.name, c.description
             FROM M_CATEGORY c
             INNER JOIN T_LAW_CATEGORY_MAP m ON m.category_id = c.id
             WHERE m.law_id = ?1
             ORDER BY c.name ASC;",
            Some(law_id),
        )
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let name_text: String = row.get("name")?;
    let category = Category {
        id: row.get("id")?,
        name: parse_db_enum(&name_text, "M_CATEGORY.name")?,
        description: row.get("description")?,
    };
    category.validate()?;
    Ok(category)
}
