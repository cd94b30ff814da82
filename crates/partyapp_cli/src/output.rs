//! Output formatting for CLI commands.
//!
//! Tables use comfy-table with cyan headers; JSON output is pretty-printed.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use partyapp_core::RecordSet;

/// Builds a table with styled headers.
pub fn build_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }
    table
}

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    println!("{}", build_table(headers, rows));
}

pub fn print_record_table(records: &RecordSet) {
    if records.rows.is_empty() {
        println!("No {} records found.", records.entity);
        return;
    }
    print_table(&records.columns, records.display_rows());
}

pub fn print_record_json(records: &RecordSet) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&records.to_json())?);
    Ok(())
}

pub fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::{build_table, yes_no};

    #[test]
    fn table_contains_headers_and_cells() {
        let rendered = build_table(
            &["name", "short_name"],
            vec![vec!["Alpha".to_string(), "A".to_string()]],
        )
        .to_string();
        assert!(rendered.contains("short_name"));
        assert!(rendered.contains("Alpha"));
    }

    #[test]
    fn yes_no_labels() {
        assert_eq!(yes_no(true), "yes");
        assert_eq!(yes_no(false), "no");
    }
}
