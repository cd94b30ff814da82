//! Constraint and index naming convention.
//!
//! Names are derived only from table and column names so that schema diffs
//! stay stable across releases:
//!
//! | kind | template                                   |
//! |------|--------------------------------------------|
//! | ix   | `ix_<table>_<column>`                      |
//! | uq   | `uq_<table>__<column>`                     |
//! | ck   | `ck_<table>__<constraint>`                 |
//! | fk   | `fk_<table>__<column>__<referred_table>`   |
//! | pk   | `pk_<table>`                               |
//! | trg  | `trg_<table>__<purpose>`                   |

pub fn index_name(table: &str, column: &str) -> String {
    format!("ix_{table}_{column}")
}

pub fn unique_name(table: &str, column: &str) -> String {
    format!("uq_{table}__{column}")
}

pub fn check_name(table: &str, constraint: &str) -> String {
    format!("ck_{table}__{constraint}")
}

pub fn foreign_key_name(table: &str, column: &str, referred_table: &str) -> String {
    format!("fk_{table}__{column}__{referred_table}")
}

pub fn primary_key_name(table: &str) -> String {
    format!("pk_{table}")
}

pub fn trigger_name(table: &str, purpose: &str) -> String {
    format!("trg_{table}__{purpose}")
}

/// Double-quotes an identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::{
        check_name, foreign_key_name, index_name, primary_key_name, quote_ident, unique_name,
    };

    #[test]
    fn templates_follow_convention() {
        assert_eq!(index_name("T_LAW", "created_at"), "ix_T_LAW_created_at");
        assert_eq!(unique_name("M_PARTY", "name"), "uq_M_PARTY__name");
        assert_eq!(check_name("T_LAW", "type"), "ck_T_LAW__type");
        assert_eq!(
            foreign_key_name("T_PARTY_LAW_ROLE", "party_id", "M_PARTY"),
            "fk_T_PARTY_LAW_ROLE__party_id__M_PARTY"
        );
        assert_eq!(primary_key_name("M_CATEGORY"), "pk_M_CATEGORY");
    }

    #[test]
    fn quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("type"), "\"type\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
