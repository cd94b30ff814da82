//! DDL rendering from entity descriptors.

use crate::model::id::ID_LEN;
use crate::schema::naming::{
    check_name, foreign_key_name, index_name, primary_key_name, quote_ident, trigger_name,
    unique_name,
};
use crate::schema::{ColumnType, EntityDescriptor, EntityKind};

/// Renders `CREATE TABLE` plus indexes and triggers for every entity.
pub fn create_schema_sql() -> String {
    EntityKind::ALL
        .iter()
        .map(|kind| create_entity_sql(kind.descriptor()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders `DROP TABLE` statements, children first.
pub fn drop_schema_sql() -> String {
    EntityKind::ALL
        .iter()
        .rev()
        .map(|kind| format!("DROP TABLE IF EXISTS {};", quote_ident(kind.table())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders every statement needed for one entity.
pub fn create_entity_sql(descriptor: &EntityDescriptor) -> String {
    let mut statements = vec![create_table_sql(descriptor)];
    statements.extend(create_indexes_sql(descriptor));
    if let Some(trigger) = touch_trigger_sql(descriptor) {
        statements.push(trigger);
    }
    statements.join("\n")
}

pub fn create_table_sql(descriptor: &EntityDescriptor) -> String {
    let table = descriptor.table;
    let mut lines = Vec::new();

    for column in descriptor.columns {
        let mut line = format!(
            "    {} {}",
            quote_ident(column.name),
            column.ty.sql_type()
        );
        if !column.nullable {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = column.server_default {
            line.push_str(&format!(" DEFAULT {default}"));
        }
        lines.push(line);
    }

    lines.push(format!(
        "    CONSTRAINT {} PRIMARY KEY ({})",
        primary_key_name(table),
        quoted_list(descriptor.primary_key)
    ));

    for column in descriptor.columns.iter().filter(|column| column.unique) {
        lines.push(format!(
            "    CONSTRAINT {} UNIQUE ({})",
            unique_name(table, column.name),
            quote_ident(column.name)
        ));
    }

    for column in descriptor.columns {
        let name = quote_ident(column.name);
        match column.ty {
            ColumnType::Id => lines.push(format!(
                "    CONSTRAINT {} CHECK (length({name}) = {ID_LEN})",
                check_name(table, &format!("{}_length", column.name))
            )),
            ColumnType::Enum { values, .. } => {
                let allowed = values
                    .iter()
                    .map(|value| format!("'{value}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!(
                    "    CONSTRAINT {} CHECK ({name} IN ({allowed}))",
                    check_name(table, column.name)
                ));
            }
            _ => {}
        }
    }

    for column in descriptor.columns {
        if let Some(reference) = column.references {
            let on_delete = if reference.on_delete_cascade {
                " ON DELETE CASCADE"
            } else {
                ""
            };
            lines.push(format!(
                "    CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){on_delete}",
                foreign_key_name(table, column.name, reference.table),
                quote_ident(column.name),
                quote_ident(reference.table),
                quote_ident(reference.column)
            ));
        }
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        quote_ident(table),
        lines.join(",\n")
    )
}

pub fn create_indexes_sql(descriptor: &EntityDescriptor) -> Vec<String> {
    descriptor
        .columns
        .iter()
        .filter(|column| column.indexed)
        .map(|column| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
                index_name(descriptor.table, column.name),
                quote_ident(descriptor.table),
                quote_ident(column.name)
            )
        })
        .collect()
}

/// Refreshes the touch column after any update that left it unchanged.
fn touch_trigger_sql(descriptor: &EntityDescriptor) -> Option<String> {
    let touch = descriptor.touch_on_update?;
    let default = descriptor.column(touch)?.server_default?;
    let table = quote_ident(descriptor.table);
    let column = quote_ident(touch);
    let key = descriptor
        .primary_key
        .iter()
        .map(|key| format!("{k} = NEW.{k}", k = quote_ident(key)))
        .collect::<Vec<_>>()
        .join(" AND ");

    Some(format!(
        "CREATE TRIGGER IF NOT EXISTS {name}
AFTER UPDATE ON {table}
FOR EACH ROW WHEN NEW.{column} IS OLD.{column}
BEGIN
    UPDATE {table} SET {column} = {default} WHERE {key};
END;",
        name = trigger_name(descriptor.table, &format!("touch_{touch}")),
    ))
}

fn quoted_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{create_schema_sql, create_table_sql, drop_schema_sql};
    use crate::schema::EntityKind;

    #[test]
    fn law_table_carries_conventional_constraint_names() {
        let sql = create_table_sql(EntityKind::Law.descriptor());
        assert!(sql.contains("CONSTRAINT pk_T_LAW PRIMARY KEY (\"id\")"));
        assert!(sql.contains("CONSTRAINT uq_T_LAW__law_number UNIQUE (\"law_number\")"));
        assert!(sql.contains("CONSTRAINT ck_T_LAW__type CHECK"));
        assert!(sql.contains("CONSTRAINT ck_T_LAW__jurisdiction CHECK"));
    }

    #[test]
    fn role_table_cascades_to_both_parents() {
        let sql = create_table_sql(EntityKind::PartyLawRole.descriptor());
        assert!(sql.contains(
            "CONSTRAINT fk_T_PARTY_LAW_ROLE__party_id__M_PARTY FOREIGN KEY (\"party_id\") REFERENCES \"M_PARTY\" (\"id\") ON DELETE CASCADE"
        ));
        assert!(sql.contains("fk_T_PARTY_LAW_ROLE__law_id__T_LAW"));
    }

    #[test]
    fn schema_sql_includes_indexes_and_touch_trigger() {
        let sql = create_schema_sql();
        assert!(sql.contains("ix_T_LAW_created_at"));
        assert!(sql.contains("ix_T_LAW_CATEGORY_MAP_category_id"));
        assert!(sql.contains("ix_T_PARTY_LAW_ROLE_role"));
        assert!(sql.contains("trg_T_LAW__touch_updated_at"));
    }

    #[test]
    fn drop_order_removes_children_first() {
        let sql = drop_schema_sql();
        let role = sql.find("T_PARTY_LAW_ROLE").unwrap();
        let party = sql.find("\"M_PARTY\"").unwrap();
        assert!(role < party);
    }
}
