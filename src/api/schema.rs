//! Typed response schemas and the parse step for every endpoint.
//!
//! Each `parse_*` function takes the raw JSON body and returns a typed
//! payload or [`FetchError::Malformed`]. Nothing downstream of this module
//! touches untyped JSON, except raw-data rows whose columns are arbitrary
//! by nature.
//!
//! Where the API has served more than one shape for the same endpoint
//! (`/lm`, `/scatter`), the current shape is tried first and the older
//! shapes are normalized into the same type.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{Endpoint, FetchError};

// ---------------------------------------------------------------------------
// Shared value types
// ---------------------------------------------------------------------------

/// A scalar cell value: category labels, bin labels, raw-data cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One de-identified record from `/data`. Column order is the server's.
pub type RawRow = Map<String, Value>;

/// Deserialize a field that must be present but may be `null`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)
}

/// Deserialize a scalar label (string or number) into its display form.
fn label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(|s| s.to_string())
}

// ---------------------------------------------------------------------------
// /summary
// ---------------------------------------------------------------------------

/// One row of the descriptive-statistics table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SummaryRow {
    Continuous(ContinuousSummary),
    Categorical(CategoricalSummary),
}

impl SummaryRow {
    pub fn variable(&self) -> &str {
        match self {
            Self::Continuous(c) => &c.variable,
            Self::Categorical(c) => &c.variable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContinuousSummary {
    pub variable: String,
    #[serde(deserialize_with = "nullable")]
    pub mean: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub median: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub std: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub iqr: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub min: Option<f64>,
    #[serde(deserialize_with = "nullable")]
    pub max: Option<f64>,
    pub n: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoricalSummary {
    pub variable: String,
    #[serde(deserialize_with = "label")]
    pub category: String,
    pub count: f64,
    pub percent: f64,
}

pub fn parse_summary(value: Value) -> Result<Vec<SummaryRow>, FetchError> {
    decode(Endpoint::Summary, value)
}

// ---------------------------------------------------------------------------
// /scatter
// ---------------------------------------------------------------------------

/// One predictor value paired with its Pearson residual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub pres: f64,
}

/// All scatter points for one predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub variable: String,
    pub points: Vec<ScatterPoint>,
}

/// Parse `/scatter`.
///
/// Accepts the keyed form `{Age: [{Age, pres}, ...], ...}`, the single
/// predictor form `{points: [...]}`, and a bare array of points. The two
/// single-predictor forms need the predictor name, either from `variables`
/// or inferred from the first point's non-`pres` key.
pub fn parse_scatter(value: Value, variables: &[String]) -> Result<Vec<ScatterSeries>, FetchError> {
    const EP: Endpoint = Endpoint::Scatter;

    let single = match &value {
        Value::Array(points) => Some(points),
        Value::Object(obj) => match obj.get("points") {
            Some(Value::Array(points)) => Some(points),
            _ => None,
        },
        _ => None,
    };

    if let Some(points) = single {
        let variable = match variables.first() {
            Some(v) => v.clone(),
            None => infer_predictor(points)
                .ok_or_else(|| FetchError::malformed(EP, "cannot infer predictor name"))?,
        };
        let points = scatter_points(points, &variable)?;
        return Ok(vec![ScatterSeries { variable, points }]);
    }

    let obj = as_object(EP, &value, "body")?;
    selected_keys(obj, variables)
        .into_iter()
        .map(|variable| {
            let points = as_array(EP, &obj[&variable], &variable)?;
            let points = scatter_points(points, &variable)?;
            Ok(ScatterSeries { variable, points })
        })
        .collect()
}

fn infer_predictor(points: &[Value]) -> Option<String> {
    points
        .first()?
        .as_object()?
        .keys()
        .find(|k| k.as_str() != "pres")
        .cloned()
}

fn scatter_points(points: &[Value], variable: &str) -> Result<Vec<ScatterPoint>, FetchError> {
    const EP: Endpoint = Endpoint::Scatter;
    let mut out = Vec::with_capacity(points.len());
    for point in points {
        let obj = as_object(EP, point, "point")?;
        let x = nullable_number(EP, obj, variable)?;
        let pres = nullable_number(EP, obj, "pres")?;
        // Missing observations are dropped, as the chart would skip them.
        if let (Some(x), Some(pres)) = (x, pres) {
            out.push(ScatterPoint { x, pres });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// /bins and /categorical
// ---------------------------------------------------------------------------

/// Residuals grouped by one bin or category level.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualGroup {
    /// Bin label (`"(40, 50]"`) or category level.
    pub label: String,
    pub mean: f64,
    pub se: Option<f64>,
    /// Individual residuals in the group.
    pub points: Vec<f64>,
}

/// Groups for one predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedResiduals {
    pub variable: String,
    pub groups: Vec<ResidualGroup>,
}

/// Parse `/bins`: `{Age: [{bin, mean, se, points}], ...}`.
pub fn parse_bins(value: Value, variables: &[String]) -> Result<Vec<GroupedResiduals>, FetchError> {
    parse_grouped(Endpoint::Bins, value, variables, "bin")
}

/// Parse `/categorical`: `{Sex: [{category, mean, se, points}], ...}`.
///
/// Older payloads keyed the level by the variable name instead of
/// `category`; both are accepted.
pub fn parse_categorical(
    value: Value,
    variables: &[String],
) -> Result<Vec<GroupedResiduals>, FetchError> {
    parse_grouped(Endpoint::Categorical, value, variables, "category")
}

fn parse_grouped(
    endpoint: Endpoint,
    value: Value,
    variables: &[String],
    label_key: &str,
) -> Result<Vec<GroupedResiduals>, FetchError> {
    // A bare array is the response to a single-variable request.
    if let Value::Array(groups) = &value {
        let variable = variables.first().cloned().ok_or_else(|| {
            FetchError::malformed(endpoint, "array body without a requested variable")
        })?;
        let groups = residual_groups(endpoint, groups, &variable, label_key)?;
        return Ok(vec![GroupedResiduals { variable, groups }]);
    }

    let obj = as_object(endpoint, &value, "body")?;
    selected_keys(obj, variables)
        .into_iter()
        .map(|variable| {
            let groups = as_array(endpoint, &obj[&variable], &variable)?;
            let groups = residual_groups(endpoint, groups, &variable, label_key)?;
            Ok(GroupedResiduals { variable, groups })
        })
        .collect()
}

fn residual_groups(
    endpoint: Endpoint,
    groups: &[Value],
    variable: &str,
    label_key: &str,
) -> Result<Vec<ResidualGroup>, FetchError> {
    groups
        .iter()
        .map(|group| {
            let obj = as_object(endpoint, group, "group")?;
            let label = match obj.get(label_key).or_else(|| obj.get(variable)) {
                Some(v) => scalar_text(v),
                None => {
                    return Err(FetchError::malformed(
                        endpoint,
                        format!("group missing `{label_key}`"),
                    ));
                }
            };
            Ok(ResidualGroup {
                label,
                mean: number(endpoint, obj, "mean")?,
                se: obj.get("se").and_then(Value::as_f64),
                points: number_array(endpoint, obj, "points")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// /category_pred
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CategoryPredPayload {
    categories: Vec<CategoryPrediction>,
}

/// Predicted probabilities and observed mortality for one category level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryPrediction {
    #[serde(deserialize_with = "label")]
    pub category: String,
    pub pred_values: Vec<f64>,
    pub actual_mortality: f64,
    #[serde(default)]
    pub n: Option<f64>,
    #[serde(default)]
    pub ci_lower: Option<f64>,
    #[serde(default)]
    pub ci_upper: Option<f64>,
}

pub fn parse_category_pred(value: Value) -> Result<Vec<CategoryPrediction>, FetchError> {
    decode::<CategoryPredPayload>(Endpoint::CategoryPred, value).map(|p| p.categories)
}

// ---------------------------------------------------------------------------
// /smooth_residual
// ---------------------------------------------------------------------------

/// Binned residual means with a confidence band, plus a smoothed curve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SmoothResidual {
    pub binned: BinnedBand,
    pub smooth: SmoothCurve,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BinnedBand {
    pub x: Vec<f64>,
    pub mean: Vec<f64>,
    pub ci_upper: Vec<f64>,
    pub ci_lower: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SmoothCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

pub fn parse_smooth_residual(value: Value) -> Result<SmoothResidual, FetchError> {
    const EP: Endpoint = Endpoint::SmoothResidual;
    let payload: SmoothResidual = decode(EP, value)?;

    let n = payload.binned.x.len();
    if payload.binned.mean.len() != n
        || payload.binned.ci_upper.len() != n
        || payload.binned.ci_lower.len() != n
    {
        return Err(FetchError::malformed(EP, "binned arrays differ in length"));
    }
    if payload.smooth.x.len() != payload.smooth.y.len() {
        return Err(FetchError::malformed(EP, "smooth x and y differ in length"));
    }

    Ok(payload)
}

// ---------------------------------------------------------------------------
// /lm and /logistic_regression
// ---------------------------------------------------------------------------

/// One model term: estimate (coefficient or odds ratio), CI and p-value.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionRow {
    pub variable: String,
    pub estimate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub p_value: f64,
}

/// Parse `/lm` (estimate key `coef`).
pub fn parse_lm(value: Value) -> Result<Vec<RegressionRow>, FetchError> {
    parse_regression(Endpoint::Lm, value, "coef")
}

/// Parse `/logistic_regression` (estimate key `OR`).
pub fn parse_logistic(value: Value) -> Result<Vec<RegressionRow>, FetchError> {
    parse_regression(Endpoint::LogisticRegression, value, "OR")
}

/// Normalize the three regression shapes the API has served:
///
/// - columns: `{coef: {Age: ..}, CI_lower: {Age: ..}, CI_upper: {..}, p_value: {..}}`
/// - rows keyed by term: `{Age: {coef, CI_lower, CI_upper, p_value}}`
/// - array of rows: `[{variable, coef, CI_lower, CI_upper, p_value}]`
fn parse_regression(
    endpoint: Endpoint,
    value: Value,
    estimate_key: &str,
) -> Result<Vec<RegressionRow>, FetchError> {
    match &value {
        Value::Array(rows) => rows
            .iter()
            .map(|row| {
                let obj = as_object(endpoint, row, "row")?;
                let variable = obj
                    .get("variable")
                    .or_else(|| obj.get("term"))
                    .map(scalar_text)
                    .ok_or_else(|| FetchError::malformed(endpoint, "row missing `variable`"))?;
                regression_row(endpoint, variable, obj, estimate_key)
            })
            .collect(),
        Value::Object(obj) => match obj.get(estimate_key) {
            Some(Value::Object(estimates)) => estimates
                .keys()
                .map(|variable| {
                    Ok(RegressionRow {
                        variable: variable.clone(),
                        estimate: column_value(endpoint, obj, estimate_key, variable)?,
                        ci_lower: column_value(endpoint, obj, "CI_lower", variable)?,
                        ci_upper: column_value(endpoint, obj, "CI_upper", variable)?,
                        p_value: column_value(endpoint, obj, "p_value", variable)?,
                    })
                })
                .collect(),
            Some(_) => Err(FetchError::malformed(
                endpoint,
                format!("`{estimate_key}` is not an object"),
            )),
            None => obj
                .iter()
                .map(|(variable, row)| {
                    let row = as_object(endpoint, row, variable)?;
                    regression_row(endpoint, variable.clone(), row, estimate_key)
                })
                .collect(),
        },
        _ => Err(FetchError::malformed(endpoint, "expected an object or array")),
    }
}

fn regression_row(
    endpoint: Endpoint,
    variable: String,
    obj: &Map<String, Value>,
    estimate_key: &str,
) -> Result<RegressionRow, FetchError> {
    Ok(RegressionRow {
        variable,
        estimate: number(endpoint, obj, estimate_key)?,
        ci_lower: number_any(endpoint, obj, &["CI_lower", "ci_lower"])?,
        ci_upper: number_any(endpoint, obj, &["CI_upper", "ci_upper"])?,
        p_value: number_any(endpoint, obj, &["p_value", "p"])?,
    })
}

fn column_value(
    endpoint: Endpoint,
    obj: &Map<String, Value>,
    column: &str,
    variable: &str,
) -> Result<f64, FetchError> {
    obj.get(column)
        .and_then(|c| c.get(variable))
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            FetchError::malformed(endpoint, format!("missing numeric `{column}.{variable}`"))
        })
}

// ---------------------------------------------------------------------------
// /variables
// ---------------------------------------------------------------------------

/// Predictor names, split by measurement type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableList {
    #[serde(default)]
    pub continuous: Vec<String>,
    #[serde(default)]
    pub categorical: Vec<String>,
}

pub fn parse_variables(value: Value) -> Result<VariableList, FetchError> {
    decode(Endpoint::Variables, value)
}

// ---------------------------------------------------------------------------
// /data
// ---------------------------------------------------------------------------

pub fn parse_raw_data(value: Value) -> Result<Vec<RawRow>, FetchError> {
    const EP: Endpoint = Endpoint::Data;
    let Value::Array(rows) = value else {
        return Err(FetchError::malformed(EP, "expected an array of rows"));
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Object(map) => Ok(map),
            other => Err(FetchError::malformed(
                EP,
                format!("row is not an object: {other}"),
            )),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// /mortality_by_group, /calibration, /stats
// ---------------------------------------------------------------------------

/// Observed event rate for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRate {
    pub group: String,
    pub rate: f64,
    pub n: Option<f64>,
}

/// Parse `/mortality_by_group`: `[{group, rate, n}]` or `{group: rate}`.
pub fn parse_mortality(value: Value) -> Result<Vec<GroupRate>, FetchError> {
    const EP: Endpoint = Endpoint::MortalityByGroup;
    match &value {
        Value::Array(rows) => rows
            .iter()
            .map(|row| {
                let obj = as_object(EP, row, "row")?;
                let group = obj
                    .get("group")
                    .or_else(|| obj.get("category"))
                    .map(scalar_text)
                    .ok_or_else(|| FetchError::malformed(EP, "row missing `group`"))?;
                Ok(GroupRate {
                    group,
                    rate: number_any(EP, obj, &["rate", "mortality"])?,
                    n: obj.get("n").and_then(Value::as_f64),
                })
            })
            .collect(),
        Value::Object(obj) => obj
            .iter()
            .map(|(group, rate)| {
                let rate = rate
                    .as_f64()
                    .ok_or_else(|| FetchError::malformed(EP, format!("non-numeric rate for `{group}`")))?;
                Ok(GroupRate {
                    group: group.clone(),
                    rate,
                    n: None,
                })
            })
            .collect(),
        _ => Err(FetchError::malformed(EP, "expected an object or array")),
    }
}

/// Mean predicted risk against observed rate for one risk bin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalibrationPoint {
    pub predicted: f64,
    pub observed: f64,
    #[serde(default)]
    pub n: Option<f64>,
}

pub fn parse_calibration(value: Value) -> Result<Vec<CalibrationPoint>, FetchError> {
    decode(Endpoint::Calibration, value)
}

/// Mean and standard deviation of one raw-data column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStat {
    pub column: String,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

/// Parse `/stats`: `{column: {mean, std}}`.
pub fn parse_column_stats(value: Value) -> Result<Vec<ColumnStat>, FetchError> {
    const EP: Endpoint = Endpoint::Stats;
    let obj = as_object(EP, &value, "body")?;
    obj.iter()
        .map(|(column, stat)| {
            let stat = as_object(EP, stat, column)?;
            Ok(ColumnStat {
                column: column.clone(),
                mean: stat.get("mean").and_then(Value::as_f64),
                std: stat.get("std").and_then(Value::as_f64),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(endpoint: Endpoint, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::malformed(endpoint, e.to_string()))
}

fn as_object<'a>(
    endpoint: Endpoint,
    value: &'a Value,
    what: &str,
) -> Result<&'a Map<String, Value>, FetchError> {
    value
        .as_object()
        .ok_or_else(|| FetchError::malformed(endpoint, format!("{what} is not an object")))
}

fn as_array<'a>(endpoint: Endpoint, value: &'a Value, what: &str) -> Result<&'a [Value], FetchError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| FetchError::malformed(endpoint, format!("`{what}` is not an array")))
}

/// Keys of a variable-keyed payload to render: the requested variables that
/// are present, or every key when nothing was requested.
fn selected_keys(obj: &Map<String, Value>, variables: &[String]) -> Vec<String> {
    if variables.is_empty() {
        obj.keys().cloned().collect()
    } else {
        variables
            .iter()
            .filter(|v| obj.contains_key(v.as_str()))
            .cloned()
            .collect()
    }
}

fn number(endpoint: Endpoint, obj: &Map<String, Value>, key: &str) -> Result<f64, FetchError> {
    obj.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| FetchError::malformed(endpoint, format!("missing numeric `{key}`")))
}

fn number_any(endpoint: Endpoint, obj: &Map<String, Value>, keys: &[&str]) -> Result<f64, FetchError> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_f64))
        .ok_or_else(|| FetchError::malformed(endpoint, format!("missing numeric `{}`", keys[0])))
}

/// A key that must be present; `null` maps to `None`.
fn nullable_number(
    endpoint: Endpoint,
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, FetchError> {
    match obj.get(key) {
        Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| FetchError::malformed(endpoint, format!("`{key}` is not numeric"))),
        None => Err(FetchError::malformed(endpoint, format!("point missing `{key}`"))),
    }
}

/// Numeric array; `null` entries are skipped.
fn number_array(
    endpoint: Endpoint,
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Vec<f64>, FetchError> {
    let values = obj
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::malformed(endpoint, format!("missing array `{key}`")))?;
    Ok(values.iter().filter_map(Value::as_f64).collect())
}

/// Display text for a scalar JSON value, as a table cell would show it.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn summary_rows_are_tagged_by_type() {
        let rows = parse_summary(json!([
            {"variable": "Age", "type": "continuous", "mean": 64.2, "median": 66,
             "std": 11.3, "iqr": 15, "min": 21, "max": 90, "n": 512},
            {"variable": "Sex", "type": "categorical", "category": "F",
             "count": 180, "percent": 35.2}
        ]))
        .unwrap();

        assert_eq!(rows.len(), 2);
        match &rows[0] {
            SummaryRow::Continuous(c) => {
                assert_eq!(c.variable, "Age");
                assert_eq!(c.median, Some(66.0));
            }
            other => panic!("expected continuous row, got {other:?}"),
        }
        assert_eq!(rows[1].variable(), "Sex");
    }

    #[test]
    fn summary_allows_null_statistics_but_not_missing_ones() {
        let ok = parse_summary(json!([
            {"variable": "LVEF", "type": "continuous", "mean": 50.0, "median": 52.0,
             "std": null, "iqr": 10.0, "min": 20.0, "max": 70.0, "n": 1}
        ]))
        .unwrap();
        let SummaryRow::Continuous(row) = &ok[0] else {
            panic!("expected continuous row");
        };
        assert_eq!(row.std, None);

        let err = parse_summary(json!([
            {"variable": "LVEF", "type": "continuous", "mean": 50.0, "n": 1}
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn summary_category_may_be_numeric() {
        let rows = parse_summary(json!([
            {"variable": "NYHA", "type": "categorical", "category": 3, "count": 40, "percent": 7.8}
        ]))
        .unwrap();
        let SummaryRow::Categorical(row) = &rows[0] else {
            panic!("expected categorical row");
        };
        assert_eq!(row.category, "3");
    }

    #[test]
    fn summary_rejects_unknown_type() {
        let err = parse_summary(json!([{"variable": "X", "type": "ordinal"}])).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { endpoint: Endpoint::Summary, .. }));
    }

    #[test]
    fn scatter_keyed_object() {
        let series = parse_scatter(
            json!({
                "Age": [{"Age": 55, "pres": 1.2}, {"Age": 60, "pres": -0.5}],
                "LVEF": [{"LVEF": 40, "pres": 0.1}]
            }),
            &vars(&["Age", "aus"]),
        )
        .unwrap();

        assert_eq!(series.len(), 1, "absent variables are skipped");
        assert_eq!(series[0].variable, "Age");
        assert_eq!(
            series[0].points,
            vec![
                ScatterPoint { x: 55.0, pres: 1.2 },
                ScatterPoint { x: 60.0, pres: -0.5 }
            ]
        );
    }

    #[test]
    fn scatter_points_form_uses_requested_variable() {
        let series = parse_scatter(
            json!({"points": [{"LVEF": 35, "pres": 2.0}, {"LVEF": null, "pres": 1.0}]}),
            &vars(&["LVEF"]),
        )
        .unwrap();
        assert_eq!(series[0].variable, "LVEF");
        assert_eq!(series[0].points, vec![ScatterPoint { x: 35.0, pres: 2.0 }]);
    }

    #[test]
    fn scatter_bare_array_infers_variable() {
        let series = parse_scatter(json!([{"pres": 0.3, "aus": 12}]), &[]).unwrap();
        assert_eq!(series[0].variable, "aus");
    }

    #[test]
    fn scatter_missing_predictor_key_is_malformed() {
        let err = parse_scatter(json!({"Age": [{"pres": 1.0}]}), &vars(&["Age"])).unwrap_err();
        assert_eq!(err.to_string(), "malformed /scatter payload: point missing `Age`");
    }

    #[test]
    fn bins_parse_groups() {
        let parsed = parse_bins(
            json!({"Age": [
                {"bin": "(20, 40]", "mean": 0.1, "se": 0.05, "points": [0.2, 0.0, null]},
                {"bin": 2, "mean": -0.3, "se": null, "points": []}
            ]}),
            &vars(&["Age"]),
        )
        .unwrap();

        let groups = &parsed[0].groups;
        assert_eq!(groups[0].label, "(20, 40]");
        assert_eq!(groups[0].points, vec![0.2, 0.0]);
        assert_eq!(groups[1].label, "2");
        assert_eq!(groups[1].se, None);
    }

    #[test]
    fn categorical_accepts_variable_keyed_level() {
        let parsed = parse_categorical(
            json!({"Sex": [{"Sex": "M", "mean": 0.2, "se": 0.1, "points": [0.2]}]}),
            &vars(&["Sex"]),
        )
        .unwrap();
        assert_eq!(parsed[0].groups[0].label, "M");
    }

    #[test]
    fn categorical_group_without_label_is_malformed() {
        let err = parse_categorical(
            json!({"Sex": [{"mean": 0.2, "se": 0.1, "points": []}]}),
            &vars(&["Sex"]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn category_pred_parses() {
        let cats = parse_category_pred(json!({"categories": [
            {"category": "urgent", "pred_values": [0.1, 0.2], "actual_mortality": 0.15,
             "n": 20, "ci_lower": 0.05, "ci_upper": 0.3}
        ]}))
        .unwrap();
        assert_eq!(cats[0].category, "urgent");
        assert_eq!(cats[0].n, Some(20.0));
    }

    #[test]
    fn smooth_residual_checks_lengths() {
        let ok = parse_smooth_residual(json!({
            "binned": {"x": [1, 2], "mean": [0.1, 0.2], "ci_upper": [0.3, 0.4], "ci_lower": [-0.1, 0.0]},
            "smooth": {"x": [1, 1.5, 2], "y": [0.1, 0.15, 0.2]}
        }));
        assert!(ok.is_ok());

        let err = parse_smooth_residual(json!({
            "binned": {"x": [1, 2], "mean": [0.1], "ci_upper": [0.3, 0.4], "ci_lower": [-0.1, 0.0]},
            "smooth": {"x": [], "y": []}
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "malformed /smooth_residual payload: binned arrays differ in length");
    }

    #[test]
    fn lm_columns_shape() {
        let rows = parse_lm(json!({
            "coef": {"Age": 0.02, "LVEF": -0.01},
            "CI_lower": {"Age": 0.01, "LVEF": -0.02},
            "CI_upper": {"Age": 0.03, "LVEF": 0.0},
            "p_value": {"Age": 0.0007, "LVEF": 0.2}
        }))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].variable, "Age");
        assert_eq!(rows[1].variable, "LVEF");
        assert_eq!(rows[0].p_value, 0.0007);
    }

    #[test]
    fn lm_array_shape() {
        let rows = parse_lm(json!([
            {"variable": "Age", "coef": 0.02, "CI_lower": 0.01, "CI_upper": 0.03, "p_value": 0.0007}
        ]))
        .unwrap();
        assert_eq!(rows[0].estimate, 0.02);
    }

    #[test]
    fn lm_missing_column_is_malformed() {
        let err = parse_lm(json!({"coef": {"Age": 0.02}, "CI_lower": {"Age": 0.01}})).unwrap_err();
        assert_eq!(err.to_string(), "malformed /lm payload: missing numeric `CI_upper.Age`");
    }

    #[test]
    fn logistic_rows_keyed_by_variable() {
        let rows = parse_logistic(json!({
            "Age": {"OR": 1.04, "CI_lower": 1.01, "CI_upper": 1.07, "p_value": 0.01}
        }))
        .unwrap();
        assert_eq!(rows[0].variable, "Age");
        assert_eq!(rows[0].estimate, 1.04);
    }

    #[test]
    fn raw_data_requires_array_of_objects() {
        let rows = parse_raw_data(json!([{"id": 1, "Age": 60}])).unwrap();
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["id", "Age"]);
        assert!(parse_raw_data(json!([])).unwrap().is_empty());
        assert!(parse_raw_data(json!({"rows": []})).is_err());
        assert!(parse_raw_data(json!([1, 2])).is_err());
    }

    #[test]
    fn mortality_both_shapes() {
        let rows = parse_mortality(json!([{"group": "NYHA IV", "rate": 0.12, "n": 50}])).unwrap();
        assert_eq!(rows[0].n, Some(50.0));
        let rows = parse_mortality(json!({"elective": 0.02, "urgent": 0.08})).unwrap();
        assert_eq!(rows[1].group, "urgent");
    }

    #[test]
    fn column_stats_parse() {
        let stats = parse_column_stats(json!({"Age": {"mean": 64.0, "std": 11.0}})).unwrap();
        assert_eq!(stats[0].column, "Age");
        assert_eq!(stats[0].std, Some(11.0));
    }

    #[test]
    fn variables_default_missing_lists() {
        let list = parse_variables(json!({"continuous": ["Age"]})).unwrap();
        assert_eq!(list.continuous, vec!["Age"]);
        assert!(list.categorical.is_empty());
    }

    #[test]
    fn scalar_text_formats_like_a_cell() {
        assert_eq!(scalar_text(&json!(null)), "");
        assert_eq!(scalar_text(&json!("x")), "x");
        assert_eq!(scalar_text(&json!(3)), "3");
        assert_eq!(scalar_text(&json!(2.5)), "2.5");
        assert_eq!(scalar_text(&json!(true)), "true");
    }
}
