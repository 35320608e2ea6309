//! Render-ready artifacts: tables and chart specifications.
//!
//! A section's mapper produces [`Artifact`]s; the renderers in
//! [`terminal`] and [`html`] turn them into output. Chart drawing itself
//! belongs to Plotly: a [`ChartSpec`] serializes directly to Plotly's
//! `{data, layout}` shape.

pub mod html;
pub mod terminal;

use std::collections::HashSet;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A table with a fixed header row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// One table row. `emphasis` marks rows to highlight (significant terms).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<String>,
    pub emphasis: bool,
}

impl Row {
    pub fn plain(cells: Vec<String>) -> Self {
        Self {
            cells,
            emphasis: false,
        }
    }
}

impl Table {
    pub fn new<S: Into<String>>(title: impl Into<String>, headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            title: title.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// A chart handed to Plotly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// DOM-safe identifier, unique within a page.
    pub id: String,
    pub title: String,
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// Plotly trace type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Box,
    Bar,
}

/// An x coordinate: numeric or a category label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Coord {
    Num(f64),
    Label(String),
}

impl Coord {
    pub fn label(s: impl Into<String>) -> Self {
        Self::Label(s.into())
    }
}

/// Error bars in data units. Symmetric unless `arrayminus` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBars {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub array: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrayminus: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symmetric: Option<bool>,
    pub visible: bool,
}

impl ErrorBars {
    pub fn data(array: Vec<f64>) -> Self {
        Self {
            kind: "data",
            array,
            arrayminus: None,
            symmetric: None,
            visible: true,
        }
    }

    pub fn asymmetric(plus: Vec<f64>, minus: Vec<f64>) -> Self {
        Self {
            arrayminus: Some(minus),
            symmetric: Some(false),
            ..Self::data(plus)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
}

/// One Plotly trace. Optional fields are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    pub x: Vec<Coord>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_y: Option<ErrorBars>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boxpoints: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointpos: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

impl Trace {
    /// A trace with only the required fields set.
    pub fn new(kind: TraceKind, name: impl Into<String>, x: Vec<Coord>, y: Vec<f64>) -> Self {
        Self {
            kind,
            name: name.into(),
            x,
            y,
            mode: None,
            error_y: None,
            marker: None,
            line: None,
            fill: None,
            fillcolor: None,
            boxpoints: None,
            jitter: None,
            pointpos: None,
            showlegend: None,
        }
    }

    pub fn markers(name: impl Into<String>, x: Vec<Coord>, y: Vec<f64>) -> Self {
        Self {
            mode: Some("markers"),
            ..Self::new(TraceKind::Scatter, name, x, y)
        }
    }

    pub fn lines(name: impl Into<String>, x: Vec<Coord>, y: Vec<f64>) -> Self {
        Self {
            mode: Some("lines"),
            ..Self::new(TraceKind::Scatter, name, x, y)
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.marker = Some(Marker {
            color: color.to_string(),
            size: None,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

impl Layout {
    pub fn new(title: impl Into<String>, x_title: impl Into<String>, y_title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            xaxis: Axis {
                title: x_title.into(),
                range: None,
            },
            yaxis: Axis {
                title: y_title.into(),
                range: None,
            },
        }
    }

    pub fn with_y_range(mut self, range: [f64; 2]) -> Self {
        self.yaxis.range = Some(range);
        self
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Output of one section's transform step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Artifact {
    Table(Table),
    Chart(ChartSpec),
}

/// Make an identifier safe for use as an HTML id.
pub fn dom_id(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| {
            p.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Suffix `-2`, `-3`, ... onto ids that repeat an earlier one, so names
/// differing only in case or punctuation stay distinct.
pub fn dedupe_ids<'a>(ids: impl IntoIterator<Item = &'a mut String>) {
    let mut seen: HashSet<String> = HashSet::new();
    for id in ids {
        if seen.contains(id.as_str()) {
            let mut n = 2;
            while seen.contains(&format!("{id}-{n}")) {
                n += 1;
            }
            *id = format!("{id}-{n}");
        }
        seen.insert(id.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_serializes_to_plotly_shape() {
        let trace = Trace::markers("Age", vec![Coord::Num(55.0)], vec![1.2]).with_color("red");
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["type"], "scatter");
        assert_eq!(json["mode"], "markers");
        assert_eq!(json["x"][0], 55.0);
        assert_eq!(json["marker"]["color"], "red");
        assert!(json.get("error_y").is_none());
    }

    #[test]
    fn artifact_is_tagged() {
        let table = Table::new("Summary", ["a", "b"]);
        let json = serde_json::to_value(Artifact::Table(table)).unwrap();
        assert_eq!(json["kind"], "table");
        assert_eq!(json["headers"][1], "b");
    }

    #[test]
    fn layout_range_only_when_set() {
        let layout = Layout::new("t", "x", "y");
        let json = serde_json::to_value(&layout).unwrap();
        assert!(json["yaxis"].get("range").is_none());

        let json = serde_json::to_value(layout.with_y_range([-4.0, 4.0])).unwrap();
        assert_eq!(json["yaxis"]["range"][0], -4.0);
    }

    #[test]
    fn dom_id_sanitizes() {
        assert_eq!(dom_id(&["scatter", "Age"]), "scatter-age");
        assert_eq!(dom_id(&["cat", "NYHA class"]), "cat-nyha-class");
    }

    #[test]
    fn repeated_ids_get_suffixes() {
        let mut ids = vec![
            dom_id(&["cat", "NYHA class"]),
            dom_id(&["cat", "NYHA-class"]),
            dom_id(&["cat", "nyha class"]),
            "cat-age".to_string(),
        ];
        dedupe_ids(ids.iter_mut());
        assert_eq!(ids, vec!["cat-nyha-class", "cat-nyha-class-2", "cat-nyha-class-3", "cat-age"]);
    }

    #[test]
    fn layout_has_only_title_and_axes() {
        let json = serde_json::to_value(Layout::new("t", "x", "y")).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "xaxis", "yaxis"]);
    }
}
