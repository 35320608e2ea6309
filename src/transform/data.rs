//! Raw data table for `/data`.

use crate::api::schema::{RawRow, scalar_text};
use crate::render::{Row, Table};

pub const RAW_TITLE: &str = "Raw data";

/// Headers are the union of keys in first-seen order; a record without a
/// key gets an empty cell. An empty payload gives an empty table.
pub fn raw_data_table(rows: &[RawRow]) -> Table {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }

    let mut table = Table::new(RAW_TITLE, headers.clone());
    for row in rows {
        let cells = headers
            .iter()
            .map(|h| row.get(h).map(scalar_text).unwrap_or_default())
            .collect();
        table.push(Row::plain(cells));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn rows(value: Value) -> Vec<RawRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn empty_payload_gives_empty_table() {
        let table = raw_data_table(&[]);
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn headers_are_union_in_first_seen_order() {
        let table = raw_data_table(&rows(json!([
            {"Age": 55, "Sex": "M"},
            {"Age": 61.5, "LVEF": 40, "Sex": null}
        ])));
        assert_eq!(table.headers, vec!["Age", "Sex", "LVEF"]);
        assert_eq!(table.rows[0].cells, vec!["55", "M", ""]);
        assert_eq!(table.rows[1].cells, vec!["61.5", "", "40"]);
    }
}
