use chrono::NaiveDate;
use partyapp_core::db::open_db_in_memory;
use partyapp_core::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use partyapp_core::repo::law_repo::{LawRepository, SqliteLawRepository};
use partyapp_core::repo::party_repo::{PartyRepository, SqlitePartyRepository};
use partyapp_core::repo::role_repo::{PartyLawRoleRepository, SqlitePartyLawRoleRepository};
use partyapp_core::{
    Category, CategoryType, JurisdictionLevel, Law, LawCategoryMap, LawType, ModelValidationError,
    Party, PartyLawRole, PartyRole, RepoError,
};
use rusqlite::Connection;

#[test]
fn party_create_get_and_update_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePartyRepository::try_new(&conn).unwrap();

    let mut party = Party::new("Alpha");
    party.founded_on = NaiveDate::from_ymd_opt(1955, 11, 15);
    let id = repo.create_party(&party).unwrap();

    party.short_name = Some("A".to_string());
    repo.update_party(&party).unwrap();

    let loaded = repo.get_party(&id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.short_name.as_deref(), Some("A"));
    assert_eq!(loaded.founded_on, NaiveDate::from_ymd_opt(1955, 11, 15));
    assert_eq!(
        repo.find_party_by_name("Alpha").unwrap().map(|party| party.id),
        Some(id)
    );
}

#[test]
fn party_name_is_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePartyRepository::try_new(&conn).unwrap();

    repo.create_party(&Party::new("Alpha")).unwrap();
    let err = repo.create_party(&Party::new("Alpha")).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(repo.list_parties().unwrap().len(), 1);
}

#[test]
fn validation_runs_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePartyRepository::try_new(&conn).unwrap();

    let err = repo.create_party(&Party::new("x".repeat(51))).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::TooLong { max_chars: 50, .. })
    ));

    let mut party = Party::new("Beta");
    party.id = "short".to_string();
    assert!(matches!(
        repo.create_party(&party),
        Err(RepoError::Validation(ModelValidationError::InvalidId(_)))
    ));
}

#[test]
fn update_and_delete_missing_rows_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePartyRepository::try_new(&conn).unwrap();

    let party = Party::new("Ghost");
    assert!(matches!(
        repo.update_party(&party),
        Err(RepoError::NotFound { entity: "Party", .. })
    ));
    assert!(matches!(
        repo.delete_party(&party.id),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn law_updates_refresh_updated_at_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLawRepository::try_new(&conn).unwrap();

    let mut law = Law::new("Budget Act", LawType::Statute, JurisdictionLevel::National);
    law.law_number = Some("2024-001".to_string());
    let id = repo.create_law(&law).unwrap();

    conn.execute(
        "UPDATE T_LAW SET created_at = '2000-01-01 00:00:00.000', updated_at = '2000-01-01 00:00:00.000' WHERE id = ?1;",
        [&id],
    )
    .unwrap();

    law.summary = Some("amended".to_string());
    repo.update_law(&law).unwrap();

    let loaded = repo.find_law_by_number("2024-001").unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.summary.as_deref(), Some("amended"));
    assert_eq!(loaded.created_at.as_deref(), Some("2000-01-01 00:00:00.000"));
    assert_ne!(loaded.updated_at.as_deref(), Some("2000-01-01 00:00:00.000"));
}

#[test]
fn invalid_enum_values_are_rejected_by_the_database() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO T_LAW (id, title, type, jurisdiction)
             VALUES ('0000000000000000AA', 'Bad', 'decree', 'national');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}

#[test]
fn deleting_a_law_cascades_to_associations() {
    let conn = open_db_in_memory().unwrap();
    let (law_id, party_id, category_id) = seed_graph(&conn);

    SqliteLawRepository::try_new(&conn)
        .unwrap()
        .delete_law(&law_id)
        .unwrap();

    assert_eq!(count(&conn, "T_LAW_CATEGORY_MAP"), 0);
    assert_eq!(count(&conn, "T_PARTY_LAW_ROLE"), 0);
    assert!(SqlitePartyRepository::try_new(&conn)
        .unwrap()
        .get_party(&party_id)
        .unwrap()
        .is_some());
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    assert_eq!(categories.list_categories().unwrap().len(), 1);
    assert_eq!(categories.list_categories().unwrap()[0].id, category_id);
}

#[test]
fn deleting_a_party_cascades_to_its_roles() {
    let conn = open_db_in_memory().unwrap();
    let (law_id, party_id, _) = seed_graph(&conn);

    SqlitePartyRepository::try_new(&conn)
        .unwrap()
        .delete_party(&party_id)
        .unwrap();

    let roles = SqlitePartyLawRoleRepository::try_new(&conn).unwrap();
    assert!(roles.roles_for_law(&law_id).unwrap().is_empty());
    assert_eq!(count(&conn, "T_LAW_CATEGORY_MAP"), 1);
}

#[test]
fn association_helpers_are_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let (law_id, party_id, category_id) = seed_graph(&conn);
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    let roles = SqlitePartyLawRoleRepository::try_new(&conn).unwrap();

    let link = LawCategoryMap {
        law_id: law_id.clone(),
        category_id,
    };
    assert!(!categories.link_law(&link).unwrap());
    assert_eq!(categories.categories_for_law(&law_id).unwrap().len(), 1);

    let mut role = PartyLawRole::new(law_id.clone(), party_id.clone(), PartyRole::Submitter);
    role.note = Some("revised".to_string());
    roles.put_role(&role).unwrap();
    let stored = roles.roles_for_party(&party_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].note.as_deref(), Some("revised"));

    categories.unlink_law(&link).unwrap();
    assert!(matches!(
        categories.unlink_law(&link),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn repositories_require_a_ready_schema() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqlitePartyRepository::try_new(&conn),
        Err(RepoError::Db(_))
    ));
}

fn seed_graph(conn: &Connection) -> (String, String, String) {
    let laws = SqliteLawRepository::try_new(conn).unwrap();
    let parties = SqlitePartyRepository::try_new(conn).unwrap();
    let categories = SqliteCategoryRepository::try_new(conn).unwrap();
    let roles = SqlitePartyLawRoleRepository::try_new(conn).unwrap();

    let mut law = Law::new("Budget Act", LawType::Statute, JurisdictionLevel::National);
    law.law_number = Some("2024-001".to_string());
    let law_id = laws.create_law(&law).unwrap();
    let party_id = parties.create_party(&Party::new("Alpha")).unwrap();
    let category_id = categories
        .create_category(&Category::new(CategoryType::Economy))
        .unwrap();

    assert!(categories
        .link_law(&LawCategoryMap {
            law_id: law_id.clone(),
            category_id: category_id.clone(),
        })
        .unwrap());
    roles
        .put_role(&PartyLawRole::new(
            law_id.clone(),
            party_id.clone(),
            PartyRole::Submitter,
        ))
        .unwrap();

    (law_id, party_id, category_id)
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
