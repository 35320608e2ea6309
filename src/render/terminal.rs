//! Terminal, CSV and JSON rendering of artifacts.

use colored::Colorize;

use super::{Artifact, ChartSpec, Coord, Table};

/// Widest a terminal column may grow before cells are truncated.
const MAX_COLUMN_WIDTH: usize = 28;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Format a table for the terminal: bold title, aligned columns, dimmed
/// alternate rows, emphasized rows in green.
pub fn format_table(table: &Table) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", table.title.bold().cyan()));

    if table.headers.is_empty() {
        out.push_str(&format!("  {}\n", "(no rows)".dimmed()));
        return out;
    }

    let widths = column_widths(table);
    let header = join_cells(&table.headers, &widths);
    let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

    out.push_str(&format!("  {}\n", header.bold()));
    out.push_str(&format!("  {}\n", "-".repeat(total)));

    for (i, row) in table.rows.iter().enumerate() {
        let line = join_cells(&row.cells, &widths);
        let line = if row.emphasis {
            line.green().to_string()
        } else if i % 2 == 1 {
            line.dimmed().to_string()
        } else {
            line
        };
        out.push_str(&format!("  {line}\n"));
    }

    if table.rows.is_empty() {
        out.push_str(&format!("  {}\n", "(no rows)".dimmed()));
    }

    out
}

fn column_widths(table: &Table) -> Vec<usize> {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    widths.into_iter().map(|w| w.min(MAX_COLUMN_WIDTH)).collect()
}

fn join_cells(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", truncate(cell, w)))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Render a table as CSV, header first.
pub fn table_csv(table: &Table) -> String {
    let mut out = String::new();
    if !table.headers.is_empty() {
        out.push_str(&csv_line(&table.headers));
    }
    for row in &table.rows {
        out.push_str(&csv_line(&row.cells));
    }
    out
}

fn csv_line(cells: &[String]) -> String {
    let mut line = cells.iter().map(|c| escape_csv(c)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Summarize a chart on the terminal: one line per trace with the point
/// count and the y range. Drawing is left to the HTML outputs.
pub fn format_chart(chart: &ChartSpec) -> String {
    let mut out = format!("{}\n", chart.title.bold().cyan());
    out.push_str(&format!(
        "  {:<28} {:<8} {:>7} {:>10} {:>10} {:>10}\n",
        "Trace", "Type", "Points", "y min", "y mean", "y max"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(78)));

    for trace in &chart.data {
        let (min, mean, max) = y_summary(&trace.y);
        out.push_str(&format!(
            "  {:<28} {:<8} {:>7} {:>10} {:>10} {:>10}\n",
            truncate(&trace.name, 28),
            format!("{:?}", trace.kind).to_lowercase(),
            trace.y.len(),
            fmt_opt(min),
            fmt_opt(mean),
            fmt_opt(max),
        ));
    }

    out
}

fn y_summary(values: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None, None);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (Some(min), Some(mean), Some(max))
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

/// Chart points as long-form CSV: `trace,x,y`.
pub fn chart_csv(chart: &ChartSpec) -> String {
    let mut out = String::from("trace,x,y\n");
    for trace in &chart.data {
        for (x, y) in trace.x.iter().zip(&trace.y) {
            let x = match x {
                Coord::Num(n) => n.to_string(),
                Coord::Label(s) => escape_csv(s),
            };
            out.push_str(&format!("{},{},{}\n", escape_csv(&trace.name), x, y));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Terminal form of any artifact.
pub fn format_artifact(artifact: &Artifact) -> String {
    match artifact {
        Artifact::Table(t) => format_table(t),
        Artifact::Chart(c) => format_chart(c),
    }
}

/// CSV form of any artifact.
pub fn artifact_csv(artifact: &Artifact) -> String {
    match artifact {
        Artifact::Table(t) => table_csv(t),
        Artifact::Chart(c) => chart_csv(c),
    }
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Layout, Row, Trace};

    fn sample_table() -> Table {
        let mut table = Table::new("Regression", ["Variable", "Coef"]);
        table.push(Row::plain(vec!["Age".into(), "0.020".into()]));
        table.push(Row {
            cells: vec!["Sex, male".into(), "1.500".into()],
            emphasis: true,
        });
        table
    }

    #[test]
    fn csv_escapes_commas() {
        let csv = table_csv(&sample_table());
        assert_eq!(csv, "Variable,Coef\nAge,0.020\n\"Sex, male\",1.500\n");
    }

    #[test]
    fn terminal_table_contains_cells() {
        let out = format_table(&sample_table());
        assert!(out.contains("Regression"));
        assert!(out.contains("Age"));
        assert!(out.contains("0.020"));
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let out = format_table(&Table::new("Raw data", Vec::<String>::new()));
        assert!(out.contains("(no rows)"));
        assert_eq!(table_csv(&Table::new("Raw data", Vec::<String>::new())), "");
    }

    #[test]
    fn chart_csv_is_long_form() {
        let chart = ChartSpec {
            id: "c".into(),
            title: "Age".into(),
            data: vec![Trace::markers(
                "Age",
                vec![Coord::Num(55.0), Coord::Num(60.0)],
                vec![1.2, -0.5],
            )],
            layout: Layout::new("Age", "Age", "Residuals"),
        };
        assert_eq!(chart_csv(&chart), "trace,x,y\nAge,55,1.2\nAge,60,-0.5\n");
        assert!(format_chart(&chart).contains("scatter"));
    }

    #[test]
    fn y_summary_handles_empty() {
        assert_eq!(y_summary(&[]), (None, None, None));
        assert_eq!(y_summary(&[1.0, 3.0]), (Some(1.0), Some(2.0), Some(3.0)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
    }
}
