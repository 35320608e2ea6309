//! Residual diagnostic charts: scatter, binned and categorical boxplots,
//! per-category predictions, and smoothed residual curves.

use serde::Serialize;

use super::TransformSettings;
use crate::api::schema::{CategoryPrediction, GroupedResiduals, ScatterPoint, ScatterSeries, SmoothResidual};
use crate::render::{ChartSpec, Coord, ErrorBars, Layout, Line, Trace, TraceKind, dom_id};

const SCATTER_COLOR: &str = "rgba(54, 162, 235, 0.5)";
const BINS_COLOR: &str = "rgba(255, 159, 64, 0.6)";
const CATEGORY_COLOR: &str = "rgba(75, 192, 192, 0.6)";
const BAND_COLOR: &str = "rgba(88, 166, 255, 0.2)";
const OBSERVED_COLOR: &str = "rgba(248, 81, 73, 0.9)";

/// A chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XY {
    pub x: f64,
    pub y: f64,
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

/// Map `{<var>, pres}` points to `{x, y}`.
pub fn scatter_points(points: &[ScatterPoint]) -> Vec<XY> {
    points.iter().map(|p| XY { x: p.x, y: p.pres }).collect()
}

pub fn scatter_chart(series: &ScatterSeries, settings: &TransformSettings) -> ChartSpec {
    let var = &series.variable;
    let points = scatter_points(&series.points);
    let trace = Trace::markers(
        format!("{var} vs Residuals"),
        points.iter().map(|p| Coord::Num(p.x)).collect(),
        points.iter().map(|p| p.y).collect(),
    )
    .with_color(SCATTER_COLOR);

    ChartSpec {
        id: dom_id(&["scatter", var.as_str()]),
        title: format!("{var} vs Pearson Residuals"),
        data: vec![trace],
        layout: Layout::new(format!("{var} vs Pearson Residuals"), var.as_str(), "Residuals")
            .with_y_range(settings.residual_range),
    }
}

// ---------------------------------------------------------------------------
// Grouped boxplots
// ---------------------------------------------------------------------------

/// Box trace of every residual per group, plus group means with
/// standard-error bars.
fn grouped_traces(grouped: &GroupedResiduals, color: &str) -> Vec<Trace> {
    let mut box_x = Vec::new();
    let mut box_y = Vec::new();
    for group in &grouped.groups {
        for &point in &group.points {
            box_x.push(Coord::label(group.label.clone()));
            box_y.push(point);
        }
    }

    let samples = Trace {
        boxpoints: Some("all"),
        jitter: Some(0.3),
        pointpos: Some(0.0),
        ..Trace::new(TraceKind::Box, grouped.variable.clone(), box_x, box_y).with_color(color)
    };

    let means = Trace {
        error_y: Some(ErrorBars::data(
            grouped.groups.iter().map(|g| g.se.unwrap_or(0.0)).collect(),
        )),
        ..Trace::markers(
            "Mean ± SE",
            grouped.groups.iter().map(|g| Coord::label(g.label.clone())).collect(),
            grouped.groups.iter().map(|g| g.mean).collect(),
        )
        .with_color(OBSERVED_COLOR)
    };

    vec![samples, means]
}

pub fn binned_boxplot(grouped: &GroupedResiduals, settings: &TransformSettings) -> ChartSpec {
    let var = &grouped.variable;
    let title = format!("{var} (Binned) vs Residuals");
    ChartSpec {
        id: dom_id(&["bins", var.as_str()]),
        title: title.clone(),
        data: grouped_traces(grouped, BINS_COLOR),
        layout: Layout::new(title, format!("{var} bin"), "Residuals")
            .with_y_range(settings.residual_range),
    }
}

pub fn categorical_boxplot(grouped: &GroupedResiduals, settings: &TransformSettings) -> ChartSpec {
    let var = &grouped.variable;
    let title = format!("Residuals by {var}");
    ChartSpec {
        id: dom_id(&["cat", var.as_str()]),
        title: title.clone(),
        data: grouped_traces(grouped, CATEGORY_COLOR),
        layout: Layout::new(title, var.as_str(), "Residuals").with_y_range(settings.residual_range),
    }
}

// ---------------------------------------------------------------------------
// Predictions by category
// ---------------------------------------------------------------------------

/// Predicted probabilities per level as boxes, with the observed rate and
/// its confidence interval overlaid.
pub fn category_prediction_chart(variable: &str, categories: &[CategoryPrediction]) -> ChartSpec {
    let mut box_x = Vec::new();
    let mut box_y = Vec::new();
    for cat in categories {
        for &p in &cat.pred_values {
            box_x.push(Coord::label(cat.category.clone()));
            box_y.push(p);
        }
    }

    let predicted = Trace::new(TraceKind::Box, "Predicted", box_x, box_y).with_color(CATEGORY_COLOR);

    let plus = categories
        .iter()
        .map(|c| c.ci_upper.map_or(0.0, |u| (u - c.actual_mortality).max(0.0)))
        .collect();
    let minus = categories
        .iter()
        .map(|c| c.ci_lower.map_or(0.0, |l| (c.actual_mortality - l).max(0.0)))
        .collect();

    let observed = Trace {
        error_y: Some(ErrorBars::asymmetric(plus, minus)),
        ..Trace::markers(
            "Observed mortality",
            categories.iter().map(|c| Coord::label(c.category.clone())).collect(),
            categories.iter().map(|c| c.actual_mortality).collect(),
        )
        .with_color(OBSERVED_COLOR)
    };

    let title = format!("Predicted vs observed mortality by {variable}");
    ChartSpec {
        id: dom_id(&["pred", variable]),
        title: title.clone(),
        data: vec![predicted, observed],
        layout: Layout::new(title, variable, "Probability").with_y_range([0.0, 1.0]),
    }
}

// ---------------------------------------------------------------------------
// Smoothed residuals
// ---------------------------------------------------------------------------

/// Binned means inside a shaded CI band, with the smoothed curve on top.
pub fn smooth_residual_chart(
    variable: &str,
    payload: &SmoothResidual,
    settings: &TransformSettings,
) -> ChartSpec {
    let binned = &payload.binned;
    let bx: Vec<Coord> = binned.x.iter().map(|&x| Coord::Num(x)).collect();
    let band_line = || Line {
        color: Some("rgba(0, 0, 0, 0)".to_string()),
        width: None,
        dash: None,
    };

    let upper = Trace {
        line: Some(band_line()),
        showlegend: Some(false),
        ..Trace::lines("CI upper", bx.clone(), binned.ci_upper.clone())
    };
    let lower = Trace {
        line: Some(band_line()),
        fill: Some("tonexty"),
        fillcolor: Some(BAND_COLOR.to_string()),
        ..Trace::lines("95% CI", bx.clone(), binned.ci_lower.clone())
    };
    let means = Trace::markers("Binned mean", bx, binned.mean.clone()).with_color(BINS_COLOR);
    let smooth = Trace {
        line: Some(Line {
            color: Some(SCATTER_COLOR.to_string()),
            width: Some(2.0),
            dash: None,
        }),
        ..Trace::lines(
            "Smooth",
            payload.smooth.x.iter().map(|&x| Coord::Num(x)).collect(),
            payload.smooth.y.clone(),
        )
    };

    let title = format!("{variable}: binned residuals with smooth");
    ChartSpec {
        id: dom_id(&["smooth", variable]),
        title: title.clone(),
        data: vec![upper, lower, means, smooth],
        layout: Layout::new(title, variable, "Residuals").with_y_range(settings.residual_range),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
