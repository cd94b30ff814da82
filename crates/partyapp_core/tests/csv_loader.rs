use chrono::NaiveDate;
use partyapp_core::seed::csv_loader::{normalize_row, read_rows, FieldValue, LoadError};
use partyapp_core::EntityKind;
use std::fs;

#[test]
fn missing_file_yields_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let rows = read_rows(&dir.path().join("Party.csv")).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn rows_are_trimmed_and_id_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Party.csv");
    fs::write(
        &path,
        "\u{feff}id, name ,short_name\n0000000000000000AA,  Alpha , A \n",
    )
    .unwrap();

    let rows = read_rows(&path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].line, 2);
    assert_eq!(rows[0].value("name"), Some("Alpha"));
    assert_eq!(rows[0].value("short_name"), Some("A"));
    assert!(!rows[0].fields.contains_key("id"));
}

#[test]
fn normalize_types_dates_and_absent_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Party.csv");
    fs::write(
        &path,
        "name,short_name,founded_on,dissolved_on\nAlpha,,1955-11-15,\n",
    )
    .unwrap();

    let rows = read_rows(&path).unwrap();
    let row = normalize_row(EntityKind::Party.descriptor(), &path, &rows[0]).unwrap();

    assert_eq!(row.get("name"), Some(&FieldValue::Text("Alpha".to_string())));
    assert_eq!(row.get("short_name"), None);
    assert_eq!(
        row.get("founded_on"),
        Some(&FieldValue::Date(NaiveDate::from_ymd_opt(1955, 11, 15).unwrap()))
    );
    assert_eq!(
        row.present_columns(EntityKind::Party.descriptor()),
        vec!["name", "founded_on"]
    );
    assert_eq!(row.describe_key(EntityKind::Party.descriptor()), "name=Alpha");
}

#[test]
fn normalize_rejects_malformed_dates_with_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Party.csv");
    fs::write(&path, "name,founded_on\nAlpha,1955-11-15\nBeta,1955-02-30\n").unwrap();

    let rows = read_rows(&path).unwrap();
    assert!(normalize_row(EntityKind::Party.descriptor(), &path, &rows[0]).is_ok());
    let err = normalize_row(EntityKind::Party.descriptor(), &path, &rows[1]).unwrap_err();
    match err {
        LoadError::InvalidDate {
            line,
            column,
            value,
            ..
        } => {
            assert_eq!(line, 3);
            assert_eq!(column, "founded_on");
            assert_eq!(value, "1955-02-30");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ragged_rows_are_csv_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Party.csv");
    fs::write(&path, "name,short_name\nAlpha,A,extra\n").unwrap();

    assert!(matches!(read_rows(&path), Err(LoadError::Csv { .. })));
}
