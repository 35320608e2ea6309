//! Descriptive statistics table.

use super::{PLACEHOLDER, fmt_num, fmt_opt};
use crate::api::schema::SummaryRow;
use crate::render::{Row, Table};

pub const SUMMARY_HEADERS: [&str; 12] = [
    "Variable", "Type", "Category", "Mean", "Median", "SD", "IQR", "Min", "Max", "N", "Count",
    "Percent",
];

/// One table row. Continuous rows fill the statistic columns and leave
/// category/count/percent as placeholders; categorical rows the reverse.
pub fn summary_row(row: &SummaryRow) -> Row {
    let dash = || PLACEHOLDER.to_string();

    let cells = match row {
        SummaryRow::Continuous(c) => vec![
            c.variable.clone(),
            "continuous".to_string(),
            dash(),
            fmt_opt(c.mean),
            fmt_opt(c.median),
            fmt_opt(c.std),
            fmt_opt(c.iqr),
            fmt_opt(c.min),
            fmt_opt(c.max),
            fmt_num(c.n),
            dash(),
            dash(),
        ],
        SummaryRow::Categorical(c) => vec![
            c.variable.clone(),
            "categorical".to_string(),
            c.category.clone(),
            dash(),
            dash(),
            dash(),
            dash(),
            dash(),
            dash(),
            dash(),
            fmt_num(c.count),
            format!("{}%", fmt_num(c.percent)),
        ],
    };

    Row::plain(cells)
}

pub fn summary_table(rows: &[SummaryRow]) -> Table {
    let mut table = Table::new("Descriptive statistics", SUMMARY_HEADERS);
    for row in rows {
        table.push(summary_row(row));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::schema::{CategoricalSummary, ContinuousSummary};

    #[test]
    fn continuous_row_layout() {
        let row = summary_row(&SummaryRow::Continuous(ContinuousSummary {
            variable: "Age".into(),
            mean: Some(64.5),
            median: Some(66.0),
            std: None,
            iqr: Some(15.0),
            min: Some(21.0),
            max: Some(90.0),
            n: 512.0,
        }));
        assert_eq!(
            row.cells,
            vec!["Age", "continuous", "-", "64.5", "66", "NA", "15", "21", "90", "512", "-", "-"]
        );
    }

    #[test]
    fn categorical_row_layout() {
        let row = summary_row(&SummaryRow::Categorical(CategoricalSummary {
            variable: "Sex".into(),
            category: "F".into(),
            count: 180.0,
            percent: 35.2,
        }));
        assert_eq!(
            row.cells,
            vec!["Sex", "categorical", "F", "-", "-", "-", "-", "-", "-", "-", "180", "35.2%"]
        );
        assert_eq!(row.cells.len(), SUMMARY_HEADERS.len());
    }
}
