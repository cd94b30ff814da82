use partyapp_core::db::open_db_in_memory;
use partyapp_core::repo::law_repo::{LawRepository, SqliteLawRepository};
use partyapp_core::repo::party_repo::{PartyRepository, SqlitePartyRepository};
use partyapp_core::viewer::{plan_view, run_view};
use partyapp_core::{
    view_records, JurisdictionLevel, Law, LawType, Party, SchemaError, ViewError, ViewQuery,
};
use rusqlite::types::Value;
use rusqlite::Connection;
use serde_json::json;

#[test]
fn view_returns_ordered_bounded_rows() {
    let conn = seeded_connection();

    let mut query = ViewQuery::new("Party");
    query.columns = vec!["name".to_string()];
    query.order_by = Some("name".to_string());
    query.descending = true;
    query.limit = 2;

    let records = view_records(&conn, &query).unwrap();
    assert_eq!(records.columns, vec!["name"]);
    assert_eq!(
        records.rows,
        vec![
            vec![Value::Text("Gamma".to_string())],
            vec![Value::Text("Beta".to_string())],
        ]
    );
}

#[test]
fn filters_match_typed_values_and_nulls() {
    let conn = seeded_connection();

    let mut query = ViewQuery::new("M_PARTY");
    query.columns = vec!["name".to_string(), "short_name".to_string()];
    query.filters = vec!["short_name=".to_string()];
    query.order_by = Some("name".to_string());
    let records = view_records(&conn, &query).unwrap();
    assert_eq!(records.display_rows(), vec![vec!["Beta", "NULL"], vec!["Gamma", "NULL"]]);

    let mut query = ViewQuery::new("Law");
    query.columns = vec!["title".to_string()];
    query.filters = vec!["type=ordinance".to_string(), "enacted_on=2023-07-01".to_string()];
    let records = view_records(&conn, &query).unwrap();
    assert_eq!(records.to_json(), json!([{ "title": "Climate Ordinance" }]));
}

#[test]
fn default_order_is_by_id() {
    let conn = seeded_connection();
    let records = view_records(&conn, &ViewQuery::new("Party")).unwrap();

    let ids: Vec<String> = records
        .rows
        .iter()
        .map(|row| match &row[0] {
            Value::Text(id) => id.clone(),
            other => panic!("unexpected id value: {other:?}"),
        })
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(records.columns[0], "id");
}

#[test]
fn invalid_requests_fail_before_any_query() {
    // No schema at all: a plan that reached SQL would fail with a database error.
    let conn = Connection::open_in_memory().unwrap();

    let mut query = ViewQuery::new("Party");
    query.columns = vec!["motto".to_string()];
    assert!(matches!(
        view_records(&conn, &query),
        Err(ViewError::Schema(SchemaError::UnknownColumn { .. }))
    ));

    let mut query = ViewQuery::new("Party");
    query.order_by = Some("popularity".to_string());
    assert!(matches!(
        view_records(&conn, &query),
        Err(ViewError::Schema(SchemaError::UnknownColumn { .. }))
    ));

    assert!(matches!(
        view_records(&conn, &ViewQuery::new("Senator")),
        Err(ViewError::Schema(SchemaError::UnknownEntity(_)))
    ));

    let mut query = ViewQuery::new("Law");
    query.filters = vec!["enacted_on=yesterday".to_string()];
    assert!(matches!(
        view_records(&conn, &query),
        Err(ViewError::InvalidFilterValue { .. })
    ));
}

#[test]
fn valid_plan_on_missing_schema_is_a_db_error() {
    let conn = Connection::open_in_memory().unwrap();
    let plan = plan_view(&ViewQuery::new("Party")).unwrap();
    assert!(matches!(run_view(&conn, &plan), Err(ViewError::Db(_))));
}

fn seeded_connection() -> Connection {
    let conn = open_db_in_memory().unwrap();
    {
        let parties = SqlitePartyRepository::try_new(&conn).unwrap();
        let mut alpha = Party::new("Alpha");
        alpha.short_name = Some("A".to_string());
        parties.create_party(&alpha).unwrap();
        parties.create_party(&Party::new("Beta")).unwrap();
        parties.create_party(&Party::new("Gamma")).unwrap();

        let laws = SqliteLawRepository::try_new(&conn).unwrap();
        let mut budget = Law::new("Budget Act", LawType::Statute, JurisdictionLevel::National);
        budget.law_number = Some("2024-001".to_string());
        laws.create_law(&budget).unwrap();
        let mut climate = Law::new(
            "Climate Ordinance",
            LawType::Ordinance,
            JurisdictionLevel::Local,
        );
        climate.enacted_on = chrono::NaiveDate::from_ymd_opt(2023, 7, 1);
        laws.create_law(&climate).unwrap();
    }
    conn
}
