//! Core domain logic for the party/law registry.
//! This crate owns the schema, validation rules, seeding and record views.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod seed;
pub mod viewer;

pub use db::{
    create_schema, drop_schema, ensure_schema_ready, open_db, open_db_in_memory, open_existing_db,
    schema_status, DbError, DbResult, SchemaStatus,
};
pub use logging::{default_log_level, init_logging};
pub use model::associations::{LawCategoryMap, PartyLawRole};
pub use model::category::Category;
pub use model::enums::{CategoryType, DbEnum, JurisdictionLevel, LawType, PartyRole};
pub use model::id::{generate_id, is_valid_id, RecordId};
pub use model::law::Law;
pub use model::party::Party;
pub use model::ModelValidationError;
pub use repo::{RepoError, RepoResult};
pub use schema::{EntityDescriptor, EntityKind, SchemaError};
pub use seed::{seed_directory, SeedError, SeedOptions, SeedReport};
pub use viewer::{
    plan_view, run_view, view_records, RecordSet, ViewError, ViewPlan, ViewQuery, DEFAULT_VIEW_LIMIT,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
