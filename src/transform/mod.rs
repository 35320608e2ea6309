//! Transform step: typed payloads → tables and chart specs.
//!
//! Everything here is pure. Parsing lives in [`crate::api::schema`];
//! output lives in [`crate::render`].

pub mod data;
pub mod outcomes;
pub mod regression;
pub mod residuals;
pub mod summary;

use crate::config::schema::AnalysisConfig;

/// Placeholder for cells that do not apply to a row.
pub const PLACEHOLDER: &str = "-";

/// Shown for statistics the API reported as `null`.
pub const MISSING: &str = "NA";

/// Display knobs shared by the transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSettings {
    /// Fixed y-axis range for residual charts.
    pub residual_range: [f64; 2],
    /// p-value below which a model term is flagged significant.
    pub significance: f64,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            residual_range: [-4.0, 4.0],
            significance: 0.05,
        }
    }
}

impl From<&AnalysisConfig> for TransformSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            residual_range: config.residual_range,
            significance: config.significance,
        }
    }
}

/// Format a number the way the dashboard always has: shortest exact form,
/// no trailing `.0`.
pub fn fmt_num(value: f64) -> String {
    value.to_string()
}

/// [`fmt_num`] for statistics that may be `null`.
pub fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), fmt_num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_drop_trailing_zero() {
        assert_eq!(fmt_num(55.0), "55");
        assert_eq!(fmt_num(1.25), "1.25");
        assert_eq!(fmt_num(-0.5), "-0.5");
        assert_eq!(fmt_opt(None), "NA");
    }
}
