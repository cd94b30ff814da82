//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Provide typed CRUD entry points for ad hoc inserts and reads.
//! - Isolate SQL details from seeding and CLI orchestration.
//!
//! # Invariants
//! - Write paths validate records (ids, lengths, enum members) before SQL.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories only operate on connections whose schema is ready.

use crate::db::DbError;
use crate::model::enums::DbEnum;
use crate::model::ModelValidationError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_repo;
pub mod law_repo;
pub mod party_repo;
pub mod role_repo;

/// Storage format of `DATE` columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all entity repositories.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound { entity: &'static str, key: String },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => err.source(),
            Self::Db(err) => err.source(),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn date_to_db(value: Option<NaiveDate>) -> Option<String> {
    value.map(|date| date.format(DATE_FORMAT).to_string())
}

pub(crate) fn parse_db_date(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<NaiveDate>> {
    match value {
        Some(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map(Some)
            .map_err(|_| RepoError::InvalidData(format!("invalid date `{text}` in {column}"))),
        None => Ok(None),
    }
}

pub(crate) fn parse_db_enum<E: DbEnum>(value: &str, column: &'static str) -> RepoResult<E> {
    E::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid {} `{value}` in {column}", E::NAME))
    })
}
