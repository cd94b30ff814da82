//! Command handlers.

use crate::output::{print_record_json, print_record_table, print_table, yes_no};
use anyhow::{Context, Result};
use log::info;
use partyapp_core::db::{count_rows, ping as ping_db, table_exists};
use partyapp_core::schema::ForeignKeyDef;
use partyapp_core::seed::EntityCounts;
use partyapp_core::{EntityKind, SeedOptions, ViewPlan};
use rusqlite::Connection;
use std::path::Path;

pub fn schema_create(conn: &mut Connection) -> Result<()> {
    let version = partyapp_core::create_schema(conn).context("schema creation failed")?;
    println!("Schema ready (version {version}).");
    Ok(())
}

pub fn schema_drop(conn: &mut Connection) -> Result<()> {
    partyapp_core::drop_schema(conn).context("schema drop failed")?;
    println!("All tables dropped.");
    Ok(())
}

pub fn schema_status(conn: &Connection) -> Result<()> {
    let status = partyapp_core::schema_status(conn)?;
    println!(
        "Schema version {} of {} ({})",
        status.db_version,
        status.latest_version,
        if status.is_ready() { "ready" } else { "not ready" }
    );
    let rows = status
        .tables
        .iter()
        .map(|(kind, present)| vec![kind.name().to_string(), kind.table().to_string(), yes_no(*present)])
        .collect();
    print_table(&["entity", "table", "present"], rows);
    Ok(())
}

pub fn ping(conn: &Connection, database: &Path) -> Result<()> {
    let version = ping_db(conn).context("connection test failed")?;
    info!("event=ping module=cli status=ok sqlite_version={version}");
    println!("Connected to {} (SQLite {version}).", database.display());
    Ok(())
}

pub fn models(conn: &Connection) -> Result<()> {
    let mut rows = Vec::with_capacity(EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        let present = table_exists(conn, kind.table())?;
        let count = if present {
            count_rows(conn, kind)?.to_string()
        } else {
            "-".to_string()
        };
        rows.push(vec![
            kind.name().to_string(),
            kind.table().to_string(),
            yes_no(present),
            count,
        ]);
    }
    print_table(&["entity", "table", "present", "rows"], rows);
    Ok(())
}

pub fn describe(entity: &str) -> Result<()> {
    let descriptor = EntityKind::from_name(entity)?.descriptor();
    println!("{} ({})", descriptor.name, descriptor.table);

    let rows = descriptor
        .columns
        .iter()
        .map(|column| {
            let mut keys = Vec::new();
            if descriptor.is_primary_key(column.name) {
                keys.push("primary");
            }
            if descriptor.is_business_key(column.name) {
                keys.push("business");
            }
            if column.unique {
                keys.push("unique");
            }
            if column.indexed {
                keys.push("indexed");
            }
            vec![
                column.name.to_string(),
                column.ty.label(),
                yes_no(column.nullable),
                keys.join(", "),
                column.server_default.unwrap_or("").to_string(),
                column.references.map(describe_reference).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(
        &["column", "type", "nullable", "keys", "default", "references"],
        rows,
    );
    Ok(())
}

pub fn seed(conn: &mut Connection, dir: &Path, dry_run: bool) -> Result<()> {
    let report = partyapp_core::seed_directory(conn, dir, &SeedOptions { dry_run })
        .with_context(|| format!("seeding from {} failed", dir.display()))?;

    let rows = EntityKind::ALL
        .iter()
        .map(|kind| seed_row(*kind, report.counts(*kind)))
        .collect();
    print_table(
        &["entity", "read", "inserted", "updated", "unchanged", "skipped", "planned"],
        rows,
    );
    if report.dry_run {
        println!("Dry run: no changes were written.");
    } else if report.committed {
        println!("Seed committed.");
    }
    Ok(())
}

pub fn view(conn: &Connection, plan: &ViewPlan, json: bool) -> Result<()> {
    let records = partyapp_core::run_view(conn, plan)?;
    if json {
        print_record_json(&records)
    } else {
        print_record_table(&records);
        Ok(())
    }
}

fn seed_row(kind: EntityKind, counts: EntityCounts) -> Vec<String> {
    vec![
        kind.name().to_string(),
        counts.read.to_string(),
        counts.inserted.to_string(),
        counts.updated.to_string(),
        counts.unchanged.to_string(),
        counts.skipped.to_string(),
        counts.planned.to_string(),
    ]
}

fn describe_reference(reference: ForeignKeyDef) -> String {
    let mut text = format!("{}.{}", reference.table, reference.column);
    if reference.on_delete_cascade {
        text.push_str(" (cascade)");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::describe_reference;
    use partyapp_core::schema::ForeignKeyDef;

    #[test]
    fn reference_label_marks_cascade() {
        let label = describe_reference(ForeignKeyDef {
            table: "T_LAW",
            column: "id",
            on_delete_cascade: true,
        });
        assert_eq!(label, "T_LAW.id (cascade)");
    }
}
