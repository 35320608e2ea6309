//! Outcome views: variable lists, event rates by group, calibration and
//! per-column statistics.

use super::{fmt_num, fmt_opt};
use crate::api::schema::{CalibrationPoint, ColumnStat, GroupRate, VariableList};
use crate::render::{ChartSpec, Coord, Layout, Line, Row, Table, Trace, TraceKind, dom_id};

const RATE_COLOR: &str = "rgba(153, 102, 255, 0.6)";
const CALIBRATION_COLOR: &str = "rgba(54, 162, 235, 0.8)";

pub fn variable_table(vars: &VariableList) -> Table {
    let mut table = Table::new("Variables", ["Variable", "Kind"]);
    for name in &vars.continuous {
        table.push(Row::plain(vec![name.clone(), "continuous".to_string()]));
    }
    for name in &vars.categorical {
        table.push(Row::plain(vec![name.clone(), "categorical".to_string()]));
    }
    table
}

pub fn group_rate_chart(rates: &[GroupRate]) -> ChartSpec {
    let trace = Trace::new(
        TraceKind::Bar,
        "Mortality",
        rates.iter().map(|r| Coord::label(r.group.clone())).collect(),
        rates.iter().map(|r| r.rate).collect(),
    )
    .with_color(RATE_COLOR);

    ChartSpec {
        id: dom_id(&["mortality"]),
        title: "Mortality by group".to_string(),
        data: vec![trace],
        layout: Layout::new("Mortality by group", "Group", "Rate"),
    }
}

/// Calibration points against the `y = x` line of perfect calibration.
pub fn calibration_chart(points: &[CalibrationPoint]) -> ChartSpec {
    let observed = Trace::markers(
        "Observed",
        points.iter().map(|p| Coord::Num(p.predicted)).collect(),
        points.iter().map(|p| p.observed).collect(),
    )
    .with_color(CALIBRATION_COLOR);

    let reference = Trace {
        line: Some(Line {
            color: Some("rgba(139, 148, 158, 0.8)".to_string()),
            width: Some(1.0),
            dash: Some("dash"),
        }),
        ..Trace::lines("Perfect calibration", vec![Coord::Num(0.0), Coord::Num(1.0)], vec![0.0, 1.0])
    };

    ChartSpec {
        id: dom_id(&["calibration"]),
        title: "Calibration".to_string(),
        data: vec![observed, reference],
        layout: Layout::new("Calibration", "Predicted risk", "Observed rate").with_y_range([0.0, 1.0]),
    }
}

pub fn column_stats_table(stats: &[ColumnStat]) -> Table {
    let mut table = Table::new("Column statistics", ["Column", "Mean", "SD"]);
    for stat in stats {
        table.push(Row::plain(vec![stat.column.clone(), fmt_opt(stat.mean), fmt_opt(stat.std)]));
    }
    table
}

/// Group rates as a table, for terminal and CSV output.
pub fn group_rate_table(rates: &[GroupRate]) -> Table {
    let mut table = Table::new("Mortality by group", ["Group", "Rate", "N"]);
    for rate in rates {
        table.push(Row::plain(vec![rate.group.clone(), fmt_num(rate.rate), fmt_opt(rate.n)]));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_listed_continuous_first() {
        let table = variable_table(&VariableList {
            continuous: vec!["Age".into()],
            categorical: vec!["Sex".into(), "NYHA".into()],
        });
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].cells, vec!["Age", "continuous"]);
        assert_eq!(table.rows[2].cells, vec!["NYHA", "categorical"]);
    }

    #[test]
    fn rate_chart_is_a_bar() {
        let chart = group_rate_chart(&[GroupRate {
            group: "I".into(),
            rate: 0.04,
            n: Some(100.0),
        }]);
        assert_eq!(chart.data[0].kind, TraceKind::Bar);
        assert_eq!(chart.data[0].x, vec![Coord::label("I")]);
    }

    #[test]
    fn calibration_has_reference_line() {
        let chart = calibration_chart(&[CalibrationPoint {
            predicted: 0.1,
            observed: 0.12,
            n: None,
        }]);
        assert_eq!(chart.data.len(), 2);
        assert_eq!(chart.data[1].y, vec![0.0, 1.0]);
    }

    #[test]
    fn missing_stats_render_na() {
        let table = column_stats_table(&[ColumnStat {
            column: "aus".into(),
            mean: Some(2.5),
            std: None,
        }]);
        assert_eq!(table.rows[0].cells, vec!["aus", "2.5", "NA"]);
    }
}
