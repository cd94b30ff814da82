//! Batch seeding from a directory of CSV files.
//!
//! # Responsibility
//! - Load `<Entity>.csv` files in dependency order and upsert their rows.
//! - Resolve association rows' business-key references to ids.
//! - Report per-entity outcomes.
//!
//! # Invariants
//! - One transaction per run; it is committed only when not a dry run and
//!   after every file has been processed.
//! - Any error rolls back the whole run.
//! - Dry runs never issue a write statement.
//! - Unresolvable references and unknown roles skip the row with a warning.

use crate::db::{ensure_schema_ready, DbError};
use crate::model::enums::{CategoryType, DbEnum, PartyRole};
use crate::schema::naming::quote_ident;
use crate::schema::{ColumnType, EntityDescriptor, EntityKind};
use crate::seed::csv_loader::{normalize_row, read_rows, FieldValue, LoadError, NormalizedRow, SourceRow};
use crate::seed::upsert::{upsert_row, KeyIndex, Resolution, UpsertOutcome};
use log::{debug, info, warn};
use rusqlite::{params, Connection, Transaction};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod csv_loader;
pub mod upsert;

pub type SeedResult<T> = Result<T, SeedError>;

/// Fatal seeding error; the run is rolled back.
#[derive(Debug)]
pub enum SeedError {
    Db(DbError),
    Load(LoadError),
    InvalidRow {
        entity: &'static str,
        path: PathBuf,
        line: u64,
        key: String,
        message: String,
    },
    Persistence {
        entity: &'static str,
        path: PathBuf,
        line: u64,
        key: String,
        source: rusqlite::Error,
    },
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Load(err) => write!(f, "{err}"),
            Self::InvalidRow {
                entity,
                path,
                line,
                key,
                message,
            } => write!(
                f,
                "{}:{line}: invalid {entity} row ({key}): {message}",
                path.display()
            ),
            Self::Persistence {
                entity,
                path,
                line,
                key,
                ..
            } => write!(
                f,
                "{}:{line}: failed to write {entity} row ({key})",
                path.display()
            ),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => err.source(),
            Self::Load(err) => err.source(),
            Self::InvalidRow { .. } => None,
            Self::Persistence { source, .. } => Some(source),
        }
    }
}

impl From<DbError> for SeedError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<LoadError> for SeedError {
    fn from(value: LoadError) -> Self {
        Self::Load(value)
    }
}

impl From<rusqlite::Error> for SeedError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedOptions {
    pub dry_run: bool,
}

/// Per-entity row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub read: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Rows that already existed with identical values.
    pub unchanged: usize,
    pub skipped: usize,
    /// Rows that passed validation in a dry run.
    pub planned: usize,
}

/// Outcome of a seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub dry_run: bool,
    pub committed: bool,
    pub entities: BTreeMap<EntityKind, EntityCounts>,
}

impl SeedReport {
    pub fn counts(&self, kind: EntityKind) -> EntityCounts {
        self.entities.get(&kind).copied().unwrap_or_default()
    }
}

/// Column names accepted in `PartyLawRole.csv`.
pub const ROLE_FILE_COLUMNS: &[&str] = &["party_name", "law_number", "law_title", "role", "note"];
/// Column names accepted in `LawCategoryMap.csv`.
pub const CATEGORY_MAP_FILE_COLUMNS: &[&str] = &["law_number", "law_title", "category"];

/// Seeds every known entity file found in `dir`.
pub fn seed_directory(
    conn: &mut Connection,
    dir: &Path,
    options: &SeedOptions,
) -> SeedResult<SeedReport> {
    ensure_schema_ready(conn)?;
    info!(
        "event=seed_run module=seed status=start dir={} dry_run={}",
        dir.display(),
        options.dry_run
    );

    let tx = conn.transaction()?;
    let mut report = {
        let mut run = SeedRun {
            tx: &tx,
            dir,
            dry_run: options.dry_run,
            pending: BTreeMap::new(),
            report: SeedReport {
                dry_run: options.dry_run,
                ..SeedReport::default()
            },
        };

        for kind in [EntityKind::Party, EntityKind::Category, EntityKind::Law] {
            run.seed_base_entity(kind)?;
        }
        run.seed_category_links()?;
        run.seed_party_roles()?;
        run.report
    };

    if options.dry_run {
        tx.rollback()?;
    } else {
        tx.commit()?;
        report.committed = true;
    }

    for (kind, counts) in &report.entities {
        info!(
            "event=seed_entity module=seed status=ok entity={kind} read={} inserted={} updated={} unchanged={} skipped={} planned={}",
            counts.read, counts.inserted, counts.updated, counts.unchanged, counts.skipped, counts.planned
        );
    }
    info!(
        "event=seed_run module=seed status=ok dry_run={} committed={}",
        report.dry_run, report.committed
    );
    Ok(report)
}

struct SeedRun<'a> {
    tx: &'a Transaction<'a>,
    dir: &'a Path,
    dry_run: bool,
    /// Business-key values planned during a dry run, per `(entity, column)`.
    pending: BTreeMap<(EntityKind, &'static str), Vec<String>>,
    report: SeedReport,
}

impl SeedRun<'_> {
    fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(kind.csv_file_name())
    }

    fn counts_mut(&mut self, kind: EntityKind) -> &mut EntityCounts {
        self.report.entities.entry(kind).or_default()
    }

    fn seed_base_entity(&mut self, kind: EntityKind) -> SeedResult<()> {
        let descriptor = kind.descriptor();
        let path = self.path_for(kind);
        let rows = read_rows(&path)?;
        self.counts_mut(kind).read = rows.len();

        for source in &rows {
            let row = normalize_row(descriptor, &path, source)?;
            let key = row.describe_key(descriptor);
            validate_base_row(descriptor, &row).map_err(|message| SeedError::InvalidRow {
                entity: descriptor.name,
                path: path.clone(),
                line: row.line,
                key: key.clone(),
                message,
            })?;

            if self.dry_run {
                debug!(
                    "event=seed_row module=seed status=planned entity={kind} line={} key={key}",
                    row.line
                );
                self.plan_keys(descriptor, &row);
                self.counts_mut(kind).planned += 1;
                continue;
            }

            let outcome =
                upsert_row(self.tx, descriptor, &row).map_err(|source| SeedError::Persistence {
                    entity: descriptor.name,
                    path: path.clone(),
                    line: row.line,
                    key: key.clone(),
                    source,
                })?;
            debug!(
                "event=seed_row module=seed status=ok entity={kind} line={} key={key} id={} action={}",
                row.line,
                outcome.id(),
                match outcome {
                    UpsertOutcome::Inserted(_) => "insert",
                    UpsertOutcome::Updated(_) => "update",
                    UpsertOutcome::Unchanged(_) => "none",
                }
            );
            let counts = self.counts_mut(kind);
            match outcome {
                UpsertOutcome::Inserted(_) => counts.inserted += 1,
                UpsertOutcome::Updated(_) => counts.updated += 1,
                UpsertOutcome::Unchanged(_) => counts.unchanged += 1,
            }
        }
        Ok(())
    }

    /// Remembers values later files may reference during a dry run.
    fn plan_keys(&mut self, descriptor: &EntityDescriptor, row: &NormalizedRow) {
        let reference_columns: &[&'static str] = match descriptor.kind {
            EntityKind::Party => &["name"],
            EntityKind::Category => &["name"],
            EntityKind::Law => &["law_number", "title"],
            _ => &[],
        };
        for &column in reference_columns {
            if let Some(value) = row.get(column) {
                self.pending
                    .entry((descriptor.kind, column))
                    .or_default()
                    .push(value.as_text());
            }
        }
    }

    fn key_index(&self, kind: EntityKind, column: &'static str) -> SeedResult<KeyIndex> {
        let mut index = KeyIndex::load(self.tx, kind, column)?;
        if let Some(values) = self.pending.get(&(kind, column)) {
            for value in values {
                index.mark_pending(value.clone());
            }
        }
        Ok(index)
    }

    fn seed_category_links(&mut self) -> SeedResult<()> {
        let kind = EntityKind::LawCategoryMap;
        let path = self.path_for(kind);
        let rows = read_rows(&path)?;
        self.counts_mut(kind).read = rows.len();
        if rows.is_empty() {
            return Ok(());
        }
        check_reference_columns(kind, &path, &rows, CATEGORY_MAP_FILE_COLUMNS)?;

        let laws = LawIndexes::load(self)?;
        let categories = self.key_index(EntityKind::Category, "name")?;

        for row in &rows {
            let key = describe_source_key(row, CATEGORY_MAP_FILE_COLUMNS);
            let law = laws.resolve(row);
            let category_value = row.value("category");
            let category = match category_value {
                Some(value) if CategoryType::parse(value).is_some() => categories.resolve(value),
                _ => Resolution::Missing,
            };

            let (law_id, category_id) = match (law, category) {
                (Resolution::Found(law_id), Resolution::Found(category_id)) => {
                    (law_id.to_string(), category_id.to_string())
                }
                (law, category) => {
                    if self.dry_run && is_resolvable(&law) && is_resolvable(&category) {
                        self.counts_mut(kind).planned += 1;
                        continue;
                    }
                    self.skip(kind, &path, row, &key, &describe_failure(&[
                        ("law", &law),
                        ("category", &category),
                    ]));
                    continue;
                }
            };

            if self.dry_run {
                self.counts_mut(kind).planned += 1;
                continue;
            }

            let inserted = self
                .tx
                .execute(
                    "INSERT INTO T_LAW_CATEGORY_MAP (law_id, category_id)
                     VALUES (?1, ?2)
                     ON CONFLICT (law_id, category_id) DO NOTHING;",
                    params![law_id, category_id],
                )
                .map_err(|source| SeedError::Persistence {
                    entity: kind.name(),
                    path: path.clone(),
                    line: row.line,
                    key: key.clone(),
                    source,
                })?;
            let counts = self.counts_mut(kind);
            if inserted == 1 {
                counts.inserted += 1;
            } else {
                counts.unchanged += 1;
            }
        }
        Ok(())
    }

    fn seed_party_roles(&mut self) -> SeedResult<()> {
        let kind = EntityKind::PartyLawRole;
        let path = self.path_for(kind);
        let rows = read_rows(&path)?;
        self.counts_mut(kind).read = rows.len();
        if rows.is_empty() {
            return Ok(());
        }
        check_reference_columns(kind, &path, &rows, ROLE_FILE_COLUMNS)?;

        let laws = LawIndexes::load(self)?;
        let parties = self.key_index(EntityKind::Party, "name")?;

        for row in &rows {
            let key = describe_source_key(row, &["party_name", "law_number", "law_title", "role"]);
            let party = match row.value("party_name") {
                Some(name) => parties.resolve(name),
                None => Resolution::Missing,
            };
            let law = laws.resolve(row);

            let role = match row.value("role").map(PartyRole::parse_or_err) {
                Some(Ok(role)) => role,
                Some(Err(err)) => {
                    self.skip(kind, &path, row, &key, &err.to_string());
                    continue;
                }
                None => {
                    self.skip(kind, &path, row, &key, "role is empty");
                    continue;
                }
            };

            let (party_id, law_id) = match (party, law) {
                (Resolution::Found(party_id), Resolution::Found(law_id)) => {
                    (party_id.to_string(), law_id.to_string())
                }
                (party, law) => {
                    if self.dry_run && is_resolvable(&party) && is_resolvable(&law) {
                        self.counts_mut(kind).planned += 1;
                        continue;
                    }
                    self.skip(kind, &path, row, &key, &describe_failure(&[
                        ("party", &party),
                        ("law", &law),
                    ]));
                    continue;
                }
            };

            if self.dry_run {
                self.counts_mut(kind).planned += 1;
                continue;
            }

            let persistence_error = |source| SeedError::Persistence {
                entity: kind.name(),
                path: path.clone(),
                line: row.line,
                key: key.clone(),
                source,
            };
            // Existence is only sampled for the report; the write below is
            // the single atomic upsert.
            let existed: i64 = self
                .tx
                .query_row(
                    "SELECT EXISTS(
                        SELECT 1 FROM T_PARTY_LAW_ROLE
                        WHERE law_id = ?1 AND party_id = ?2 AND role = ?3
                    );",
                    params![law_id, party_id, role.as_str()],
                    |r| r.get(0),
                )
                .map_err(persistence_error)?;
            // An empty note keeps the stored one, like absent base columns.
            let changed = self
                .tx
                .execute(
                    "INSERT INTO T_PARTY_LAW_ROLE (law_id, party_id, role, note)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (law_id, party_id, role) DO UPDATE SET note = excluded.note
                     WHERE excluded.note IS NOT NULL AND note IS NOT excluded.note;",
                    params![law_id, party_id, role.as_str(), row.value("note")],
                )
                .map_err(persistence_error)?;

            let counts = self.counts_mut(kind);
            match (existed == 1, changed) {
                (false, _) => counts.inserted += 1,
                (true, 0) => counts.unchanged += 1,
                (true, _) => counts.updated += 1,
            }
        }
        Ok(())
    }

    fn skip(&mut self, kind: EntityKind, path: &Path, row: &SourceRow, key: &str, reason: &str) {
        warn!(
            "event=seed_row module=seed status=skipped entity={kind} path={} line={} key={key} reason={reason}",
            path.display(),
            row.line
        );
        self.counts_mut(kind).skipped += 1;
    }
}

/// Law lookups by number (preferred) and by unambiguous title.
struct LawIndexes {
    by_number: KeyIndex,
    by_title: KeyIndex,
}

impl LawIndexes {
    fn load(run: &SeedRun<'_>) -> SeedResult<Self> {
        Ok(Self {
            by_number: run.key_index(EntityKind::Law, "law_number")?,
            by_title: run.key_index(EntityKind::Law, "title")?,
        })
    }

    fn resolve(&self, row: &SourceRow) -> Resolution<'_> {
        if let Some(number) = row.value("law_number") {
            return self.by_number.resolve(number);
        }
        if let Some(title) = row.value("law_title") {
            return self.by_title.resolve(title);
        }
        Resolution::Missing
    }
}

fn is_resolvable(resolution: &Resolution<'_>) -> bool {
    matches!(resolution, Resolution::Found(_) | Resolution::Pending)
}

fn describe_failure(parts: &[(&str, &Resolution<'_>)]) -> String {
    parts
        .iter()
        .filter_map(|(name, resolution)| match resolution {
            Resolution::Missing => Some(format!("{name} not found")),
            Resolution::Ambiguous => Some(format!("{name} is ambiguous")),
            Resolution::Found(_) | Resolution::Pending => None,
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_source_key(row: &SourceRow, columns: &[&str]) -> String {
    columns
        .iter()
        .filter_map(|column| row.value(column).map(|value| format!("{column}={value}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn check_reference_columns(
    kind: EntityKind,
    path: &Path,
    rows: &[SourceRow],
    allowed: &[&str],
) -> SeedResult<()> {
    for row in rows {
        for column in row.fields.keys() {
            if !allowed.contains(&column.as_str()) {
                return Err(LoadError::UnknownColumn {
                    path: path.to_path_buf(),
                    entity: kind.name(),
                    column: column.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Checks required columns, business key, enum members and text limits.
fn validate_base_row(descriptor: &EntityDescriptor, row: &NormalizedRow) -> Result<(), String> {
    for key in descriptor.business_key {
        if row.get(key).is_none() {
            return Err(format!("business key column `{key}` is empty"));
        }
    }

    for column in descriptor.columns {
        if !column.is_writable() || column.name == "id" {
            continue;
        }
        let value = match row.get(column.name) {
            Some(value) => value,
            None if column.nullable => continue,
            None => return Err(format!("required column `{}` is empty", column.name)),
        };
        match (column.ty, value) {
            (ColumnType::Enum { name, values }, FieldValue::Text(text)) => {
                if !values.contains(&text.as_str()) {
                    return Err(format!(
                        "`{text}` is not a valid {name} for column {}; expected one of {}",
                        quote_ident(column.name),
                        values.join("|")
                    ));
                }
            }
            (
                ColumnType::Text {
                    max_chars: Some(max),
                },
                FieldValue::Text(text),
            ) => {
                let actual = text.chars().count();
                if actual > max {
                    return Err(format!(
                        "column `{}` is {actual} characters long; at most {max} allowed",
                        column.name
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
