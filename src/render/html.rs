//! HTML rendering shared by the static report and the web dashboard.
//!
//! Tables render to `<table>` fragments. Charts render to an empty
//! container plus a Plotly payload that the page script mounts. Every
//! interpolated value goes through [`escape`].

use serde::Serialize;

use super::{Artifact, ChartSpec, Table};
use crate::pipeline::{SectionOutcome, SectionReport};

/// Plotly bundle loaded by generated pages.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Escape text for HTML element and attribute content.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Serialize a value for embedding inside a `<script>` element.
pub fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// A `<table>` fragment. Emphasized rows carry the `sig` class.
pub fn table_html(table: &Table) -> String {
    let mut out = String::from("<table class=\"data\">\n");

    if !table.headers.is_empty() {
        out.push_str("<thead><tr>");
        for header in &table.headers {
            out.push_str(&format!("<th>{}</th>", escape(header)));
        }
        out.push_str("</tr></thead>\n");
    }

    out.push_str("<tbody>\n");
    for row in &table.rows {
        if row.emphasis {
            out.push_str("<tr class=\"sig\">");
        } else {
            out.push_str("<tr>");
        }
        for cell in &row.cells {
            out.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");

    if table.rows.is_empty() {
        out.push_str("<p class=\"muted\">No rows.</p>\n");
    }

    out
}

/// An empty chart container; the page script plots into it.
pub fn chart_container(chart: &ChartSpec) -> String {
    format!(
        "<div class=\"chart\"><h3>{}</h3><div class=\"plot\" id=\"{}\"></div></div>\n",
        escape(&chart.title),
        escape(&chart.id)
    )
}

/// The body of one section: its artifacts, or the inline error message.
pub fn section_body(outcome: &SectionOutcome) -> String {
    match outcome {
        SectionOutcome::Rendered(artifacts) if artifacts.is_empty() => {
            "<p class=\"muted\">Nothing to display.</p>\n".to_string()
        }
        SectionOutcome::Rendered(artifacts) => artifacts
            .iter()
            .map(|artifact| match artifact {
                Artifact::Table(t) => table_html(t),
                Artifact::Chart(c) => chart_container(c),
            })
            .collect(),
        SectionOutcome::Failed(message) => {
            format!("<p class=\"error\">{}</p>\n", escape(message))
        }
    }
}

/// A complete `<section>` card.
pub fn section_html(report: &SectionReport) -> String {
    format!(
        "<section class=\"card\" id=\"section-{}\">\n<h2>{}</h2>\n{}</section>\n",
        escape(&report.id),
        escape(&report.title),
        section_body(&report.outcome)
    )
}

/// Every chart across the given sections, in page order.
pub fn collect_charts(reports: &[SectionReport]) -> Vec<&ChartSpec> {
    reports
        .iter()
        .filter_map(|r| match &r.outcome {
            SectionOutcome::Rendered(artifacts) => Some(artifacts),
            SectionOutcome::Failed(_) => None,
        })
        .flatten()
        .filter_map(|a| match a {
            Artifact::Chart(c) => Some(c),
            Artifact::Table(_) => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Full page
// ---------------------------------------------------------------------------

/// Shared page stylesheet.
pub const STYLE: &str = r#"
:root {
  --bg: #0d1117; --surface: #161b22; --border: #30363d;
  --text: #e6edf3; --muted: #8b949e; --accent: #58a6ff;
  --green: #3fb950; --red: #f85149;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }
.app { max-width: 1200px; margin: 0 auto; padding: 24px; }
header { margin-bottom: 24px; padding-bottom: 16px; border-bottom: 1px solid var(--border); }
header h1 { font-size: 24px; font-weight: 600; }
header .subtitle { color: var(--muted); font-size: 13px; }
.card { background: var(--surface); border: 1px solid var(--border); border-radius: 8px; padding: 20px; margin-bottom: 16px; overflow-x: auto; }
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }
.chart { margin: 25px 0; }
.chart h3 { font-size: 14px; color: var(--muted); margin-bottom: 8px; }
.plot { min-height: 360px; }
table.data { width: 100%; border-collapse: collapse; font-size: 13px; }
table.data th, table.data td { text-align: left; padding: 6px 10px; border-bottom: 1px solid var(--border); }
table.data th { color: var(--muted); font-weight: 500; font-size: 12px; text-transform: uppercase; }
table.data td { font-family: var(--mono); font-size: 12px; }
tr.sig td { color: var(--green); font-weight: 600; }
.muted { color: var(--muted); }
.error { color: var(--red); }
button.toggle { background: var(--accent); color: #fff; border: none; border-radius: 6px; padding: 8px 16px; cursor: pointer; margin-bottom: 12px; }
"#;

/// Defines `mountCharts(charts)`, which plots each chart spec into the
/// element with its id.
pub const MOUNT_SCRIPT: &str = r#"
const PLOT_LAYOUT = { paper_bgcolor: '#161b22', plot_bgcolor: '#161b22', font: { color: '#e6edf3' } };
function mountCharts(charts) {
  charts.forEach(c => {
    const el = document.getElementById(c.id);
    if (el) Plotly.newPlot(el, c.data, Object.assign({}, PLOT_LAYOUT, c.layout), { responsive: true });
  });
}
"#;

/// A self-contained HTML report of every section.
///
/// `raw` embeds the raw-data table inside a collapsed `<details>` block.
pub fn report_page(
    title: &str,
    subtitle: &str,
    reports: &[SectionReport],
    raw: Option<&SectionOutcome>,
) -> String {
    let mut body = String::new();
    for report in reports {
        body.push_str(&section_html(report));
    }

    if let Some(raw) = raw {
        body.push_str(&format!(
            "<section class=\"card\" id=\"section-raw\">\n<details>\n<summary>Raw data</summary>\n{}</details>\n</section>\n",
            section_body(raw)
        ));
    }

    let charts = collect_charts(reports);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
<script src="{cdn}"></script>
</head>
<body>
<div class="app">
<header><h1>{title}</h1><div class="subtitle">{subtitle}</div></header>
{body}</div>
<script>
const CHARTS = {charts};
{plot}
mountCharts(CHARTS);
</script>
</body>
</html>
"#,
        title = escape(title),
        subtitle = escape(subtitle),
        style = STYLE,
        cdn = PLOTLY_CDN,
        body = body,
        charts = script_json(&charts),
        plot = MOUNT_SCRIPT,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Coord, Layout, Row, Trace};

    fn chart() -> ChartSpec {
        ChartSpec {
            id: "scatter-age".into(),
            title: "Age vs Pearson Residuals".into(),
            data: vec![Trace::markers("Age", vec![Coord::Num(1.0)], vec![0.5])],
            layout: Layout::new("Age", "Age", "Residuals"),
        }
    }

    #[test]
    fn escape_covers_markup() {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn script_json_cannot_close_the_script_tag() {
        let s = script_json(&"</script><script>alert(1)");
        assert!(!s.contains("</script>"));
    }

    #[test]
    fn table_marks_significant_rows() {
        let mut table = Table::new("LM", ["Variable", "p"]);
        table.push(Row {
            cells: vec!["Age".into(), "<0.001".into()],
            emphasis: true,
        });
        let html = table_html(&table);
        assert!(html.contains("<tr class=\"sig\"><td>Age</td><td>&lt;0.001</td></tr>"));
    }

    #[test]
    fn failed_section_shows_inline_error() {
        let report = SectionReport {
            id: "summary".into(),
            title: "Summary".into(),
            outcome: SectionOutcome::Failed("Unable to load Summary: timeout".into()),
        };
        let html = section_html(&report);
        assert!(html.contains("class=\"error\">Unable to load Summary: timeout</p>"));
    }

    #[test]
    fn report_embeds_charts_of_rendered_sections() {
        let reports = vec![
            SectionReport {
                id: "scatter".into(),
                title: "Scatter".into(),
                outcome: SectionOutcome::Rendered(vec![Artifact::Chart(chart())]),
            },
            SectionReport {
                id: "lm".into(),
                title: "Linear model".into(),
                outcome: SectionOutcome::Failed("Unable to load Linear model".into()),
            },
        ];
        assert_eq!(collect_charts(&reports).len(), 1);

        let page = report_page("Residual diagnostics", "api", &reports, None);
        assert!(page.contains("id=\"scatter-age\""));
        assert!(page.contains("\"id\":\"scatter-age\""));
        assert!(page.contains("Unable to load Linear model"));
    }
}
