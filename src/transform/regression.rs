//! Regression result tables for `/lm` and `/logistic_regression`.

use crate::api::schema::RegressionRow;
use crate::render::{Row, Table};

/// Which model produced the rows; decides the estimate column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Linear,
    Logistic,
}

impl ModelKind {
    fn title(self) -> &'static str {
        match self {
            Self::Linear => "Linear regression on Pearson residuals",
            Self::Logistic => "Logistic regression",
        }
    }

    fn estimate_header(self) -> &'static str {
        match self {
            Self::Linear => "Coefficient",
            Self::Logistic => "Odds ratio",
        }
    }
}

/// `"<0.001"` below one in a thousand, otherwise three decimals.
pub fn format_p_value(p: f64) -> String {
    if p < 0.001 {
        "<0.001".to_string()
    } else {
        format!("{p:.3}")
    }
}

pub fn is_significant(p: f64, threshold: f64) -> bool {
    p < threshold
}

pub fn regression_row(row: &RegressionRow, significance: f64) -> Row {
    Row {
        cells: vec![
            row.variable.clone(),
            format!("{:.3}", row.estimate),
            format!("{:.3} – {:.3}", row.ci_lower, row.ci_upper),
            format_p_value(row.p_value),
        ],
        emphasis: is_significant(row.p_value, significance),
    }
}

pub fn regression_table(rows: &[RegressionRow], kind: ModelKind, significance: f64) -> Table {
    let mut table = Table::new(
        kind.title(),
        ["Variable", kind.estimate_header(), "95% CI", "p-value"],
    );
    for row in rows {
        table.push(regression_row(row, significance));
    }
    table
}
