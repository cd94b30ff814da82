//! Static entity registry and table descriptors.
//!
//! # Responsibility
//! - Map entity names (`Party`, `Law`, ...) to their table declarations.
//! - Declare columns, keys and constraints once; DDL, seeding and the record
//!   viewer all read from these descriptors.
//!
//! # Invariants
//! - `EntityKind::ALL` is in foreign-key dependency order (parents first).
//! - Every descriptor's `business_key` columns carry a uniqueness constraint
//!   (single-column `UNIQUE` or the primary key).

use crate::model::enums::{CategoryType, DbEnum, JurisdictionLevel, LawType, PartyRole};
use crate::model::id::ID_LEN;
use crate::model::law::{LAW_NUMBER_MAX, LAW_TITLE_MAX, SOURCE_HASH_MAX};
use crate::model::party::{PARTY_NAME_MAX, PARTY_SHORT_NAME_MAX};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod ddl;
pub mod naming;

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Lookup failure against the static registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    UnknownEntity(String),
    UnknownColumn {
        entity: &'static str,
        column: String,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntity(name) => write!(
                f,
                "unknown entity type `{name}`; expected one of {}",
                EntityKind::ALL
                    .iter()
                    .map(|kind| kind.name())
                    .collect::<Vec<_>>()
                    .join("|")
            ),
            Self::UnknownColumn { entity, column } => {
                write!(f, "unknown column `{column}` for entity {entity}")
            }
        }
    }
}

impl Error for SchemaError {}

/// Every persisted entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Party,
    Category,
    Law,
    LawCategoryMap,
    PartyLawRole,
}

impl EntityKind {
    /// Parents before children.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Party,
        EntityKind::Category,
        EntityKind::Law,
        EntityKind::LawCategoryMap,
        EntityKind::PartyLawRole,
    ];

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn table(self) -> &'static str {
        self.descriptor().table
    }

    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            Self::Party => &PARTY,
            Self::Category => &CATEGORY,
            Self::Law => &LAW,
            Self::LawCategoryMap => &LAW_CATEGORY_MAP,
            Self::PartyLawRole => &PARTY_LAW_ROLE,
        }
    }

    /// Resolves an entity by model name or table name, ignoring ASCII case.
    pub fn from_name(value: &str) -> SchemaResult<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.name().eq_ignore_ascii_case(trimmed)
                    || kind.table().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| SchemaError::UnknownEntity(trimmed.to_string()))
    }

    /// Seed input file name, e.g. `Party.csv`.
    pub fn csv_file_name(self) -> String {
        format!("{}.csv", self.name())
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared storage type of a column; also drives input parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 18-character generated identifier.
    Id,
    /// Free text, optionally length-limited.
    Text { max_chars: Option<usize> },
    /// Calendar date stored as `YYYY-MM-DD`.
    Date,
    /// Server-assigned timestamp text.
    Timestamp,
    /// Closed value set stored as text.
    Enum {
        name: &'static str,
        values: &'static [&'static str],
    },
}

impl ColumnType {
    pub fn sql_type(&self) -> String {
        match self {
            Self::Id => format!("CHAR({ID_LEN})"),
            Self::Text {
                max_chars: Some(max),
            } => format!("VARCHAR({max})"),
            Self::Text { max_chars: None } => "TEXT".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Enum { values, .. } => {
                let width = values.iter().map(|value| value.len()).max().unwrap_or(1);
                format!("VARCHAR({width})")
            }
        }
    }

    /// Short label for schema listings.
    pub fn label(&self) -> String {
        match self {
            Self::Enum { name, .. } => format!("enum {name}"),
            other => other.sql_type(),
        }
    }
}

/// Referenced parent of a foreign-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete_cascade: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    /// Column is unique on its own (`uq_` constraint).
    pub unique: bool,
    /// Indexed on its own (`ix_` index).
    pub indexed: bool,
    /// SQL default expression; such columns are never written by callers.
    pub server_default: Option<&'static str>,
    pub references: Option<ForeignKeyDef>,
}

impl ColumnDef {
    /// Whether callers (seed files, repositories) supply this column.
    pub fn is_writable(&self) -> bool {
        self.server_default.is_none()
    }
}

/// Full declaration of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
    pub primary_key: &'static [&'static str],
    /// Columns identifying "the same row" across seed runs.
    pub business_key: &'static [&'static str],
    /// Whether `id` is generated for new rows.
    pub generated_id: bool,
    /// Column refreshed by trigger on every update.
    pub touch_on_update: Option<&'static str>,
}

impl EntityDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn require_column(&self, name: &str) -> SchemaResult<&'static ColumnDef> {
        self.column(name).ok_or_else(|| SchemaError::UnknownColumn {
            entity: self.name,
            column: name.to_string(),
        })
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.contains(&column)
    }

    pub fn is_business_key(&self, column: &str) -> bool {
        self.business_key.contains(&column)
    }

    /// Default ordering column for listings.
    pub fn default_order_column(&self) -> &'static str {
        self.primary_key.first().copied().unwrap_or("rowid")
    }
}

const fn column(name: &'static str, ty: ColumnType, nullable: bool) -> ColumnDef {
    ColumnDef {
        name,
        ty,
        nullable,
        unique: false,
        indexed: false,
        server_default: None,
        references: None,
    }
}

const fn id_column() -> ColumnDef {
    column("id", ColumnType::Id, false)
}

const fn text(max_chars: usize) -> ColumnType {
    ColumnType::Text {
        max_chars: Some(max_chars),
    }
}

const LONG_TEXT: ColumnType = ColumnType::Text { max_chars: None };

const fn enum_type<E: DbEnum>() -> ColumnType {
    ColumnType::Enum {
        name: E::NAME,
        values: E::VALUES,
    }
}

const fn foreign_key(name: &'static str, table: &'static str, indexed: bool) -> ColumnDef {
    ColumnDef {
        indexed,
        references: Some(ForeignKeyDef {
            table,
            column: "id",
            on_delete_cascade: true,
        }),
        ..column(name, ColumnType::Id, false)
    }
}

const TIMESTAMP_NOW: &str = "(strftime('%Y-%m-%d %H:%M:%f', 'now'))";

pub(crate) const PARTY_TABLE: &str = "M_PARTY";
pub(crate) const CATEGORY_TABLE: &str = "M_CATEGORY";
pub(crate) const LAW_TABLE: &str = "T_LAW";
pub(crate) const LAW_CATEGORY_MAP_TABLE: &str = "T_LAW_CATEGORY_MAP";
pub(crate) const PARTY_LAW_ROLE_TABLE: &str = "T_PARTY_LAW_ROLE";

static PARTY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Party,
    name: "Party",
    table: PARTY_TABLE,
    columns: &[
        id_column(),
        ColumnDef {
            unique: true,
            ..column("name", text(PARTY_NAME_MAX), false)
        },
        column("short_name", text(PARTY_SHORT_NAME_MAX), true),
        column("founded_on", ColumnType::Date, true),
        column("dissolved_on", ColumnType::Date, true),
    ],
    primary_key: &["id"],
    business_key: &["name"],
    generated_id: true,
    touch_on_update: None,
};

static CATEGORY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Category,
    name: "Category",
    table: CATEGORY_TABLE,
    columns: &[
        id_column(),
        ColumnDef {
            unique: true,
            ..column("name", enum_type::<CategoryType>(), false)
        },
        column("description", LONG_TEXT, true),
    ],
    primary_key: &["id"],
    business_key: &["name"],
    generated_id: true,
    touch_on_update: None,
};

static LAW: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Law,
    name: "Law",
    table: LAW_TABLE,
    columns: &[
        id_column(),
        column("title", text(LAW_TITLE_MAX), false),
        ColumnDef {
            unique: true,
            ..column("law_number", text(LAW_NUMBER_MAX), true)
        },
        column("type", enum_type::<LawType>(), false),
        column("jurisdiction", enum_type::<JurisdictionLevel>(), false),
        column("promulgated_on", ColumnType::Date, true),
        column("enacted_on", ColumnType::Date, true),
        column("summary", LONG_TEXT, true),
        column("source_url", LONG_TEXT, true),
        column("source_hash", text(SOURCE_HASH_MAX), true),
        ColumnDef {
            indexed: true,
            server_default: Some(TIMESTAMP_NOW),
            ..column("created_at", ColumnType::Timestamp, false)
        },
        ColumnDef {
            indexed: true,
            server_default: Some(TIMESTAMP_NOW),
            ..column("updated_at", ColumnType::Timestamp, false)
        },
    ],
    primary_key: &["id"],
    business_key: &["law_number"],
    generated_id: true,
    touch_on_update: Some("updated_at"),
};

static LAW_CATEGORY_MAP: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::LawCategoryMap,
    name: "LawCategoryMap",
    table: LAW_CATEGORY_MAP_TABLE,
    columns: &[
        foreign_key("law_id", LAW_TABLE, false),
        foreign_key("category_id", CATEGORY_TABLE, true),
    ],
    primary_key: &["law_id", "category_id"],
    business_key: &["law_id", "category_id"],
    generated_id: false,
    touch_on_update: None,
};

static PARTY_LAW_ROLE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::PartyLawRole,
    name: "PartyLawRole",
    table: PARTY_LAW_ROLE_TABLE,
    columns: &[
        foreign_key("law_id", LAW_TABLE, false),
        foreign_key("party_id", PARTY_TABLE, true),
        ColumnDef {
            indexed: true,
            ..column("role", enum_type::<PartyRole>(), false)
        },
        column("note", LONG_TEXT, true),
    ],
    primary_key: &["law_id", "party_id", "role"],
    business_key: &["law_id", "party_id", "role"],
    generated_id: false,
    touch_on_update: None,
};

#[cfg(test)]
mod tests {
    use super::{ColumnType, EntityKind, SchemaError};

    #[test]
    fn from_name_accepts_model_and_table_names() {
        assert_eq!(EntityKind::from_name("Party").unwrap(), EntityKind::Party);
        assert_eq!(EntityKind::from_name("party").unwrap(), EntityKind::Party);
        assert_eq!(EntityKind::from_name("T_LAW").unwrap(), EntityKind::Law);
        assert_eq!(
            EntityKind::from_name("Senator"),
            Err(SchemaError::UnknownEntity("Senator".to_string()))
        );
    }

    #[test]
    fn business_keys_are_declared_unique() {
        for kind in EntityKind::ALL {
            let descriptor = kind.descriptor();
            for key in descriptor.business_key {
                let column = descriptor.require_column(key).unwrap();
                assert!(
                    column.unique || descriptor.primary_key == descriptor.business_key,
                    "{}.{} is not unique",
                    descriptor.name,
                    key
                );
            }
        }
    }

    #[test]
    fn enum_columns_use_widest_value_for_width() {
        let role = EntityKind::PartyLawRole
            .descriptor()
            .require_column("role")
            .unwrap();
        assert!(matches!(role.ty, ColumnType::Enum { .. }));
        assert_eq!(role.ty.sql_type(), "VARCHAR(13)");
    }

    #[test]
    fn default_order_uses_first_primary_key_column() {
        assert_eq!(EntityKind::Law.descriptor().default_order_column(), "id");
        assert_eq!(
            EntityKind::PartyLawRole.descriptor().default_order_column(),
            "law_id"
        );
    }
}
