//! Section constructors and the standard dashboard layout.

use crate::api::schema::{self, VariableList};
use crate::api::{Endpoint, Fetcher, Query};
use crate::config::StatdashConfig;
use crate::render::{Artifact, dedupe_ids, dom_id};
use crate::transform::regression::{ModelKind, regression_table};
use crate::transform::{TransformSettings, data, outcomes, residuals, summary};

use super::Section;

// ---------------------------------------------------------------------------
// Single sections
// ---------------------------------------------------------------------------

/// `/summary`, optionally limited to `vars`.
pub fn summary_section(vars: Vec<String>) -> Section {
    let query = Query::new().with_all("vars", &vars);
    Section::new("summary", "Summary statistics", Endpoint::Summary, query, |body| {
        let rows = schema::parse_summary(body)?;
        Ok(vec![Artifact::Table(summary::summary_table(&rows))])
    })
}

/// Query for endpoints that accept one optional `var`. With several
/// variables the keyed response is requested and filtered locally.
fn single_var_query(vars: &[String]) -> Query {
    match vars {
        [only] => Query::new().with("var", only),
        _ => Query::new(),
    }
}

/// One scatter chart per continuous variable.
pub fn scatter_section(vars: Vec<String>, settings: TransformSettings) -> Section {
    let query = single_var_query(&vars);
    Section::new("scatter", "Residuals vs predictors", Endpoint::Scatter, query, move |body| {
        Ok(schema::parse_scatter(body, &vars)?
            .iter()
            .map(|series| Artifact::Chart(residuals::scatter_chart(series, &settings)))
            .collect())
    })
}

pub fn bins_section(vars: Vec<String>, n_bins: u32, settings: TransformSettings) -> Section {
    let mut query = Query::new().with("n_bins", n_bins);
    if let [only] = vars.as_slice() {
        query = query.with("var", only);
    }
    Section::new("bins", "Binned residuals", Endpoint::Bins, query, move |body| {
        Ok(schema::parse_bins(body, &vars)?
            .iter()
            .map(|grouped| Artifact::Chart(residuals::binned_boxplot(grouped, &settings)))
            .collect())
    })
}

pub fn categorical_section(vars: Vec<String>, settings: TransformSettings) -> Section {
    let query = single_var_query(&vars);
    Section::new(
        "categorical",
        "Residuals by category",
        Endpoint::Categorical,
        query,
        move |body| {
            Ok(schema::parse_categorical(body, &vars)?
                .iter()
                .map(|grouped| Artifact::Chart(residuals::categorical_boxplot(grouped, &settings)))
                .collect())
        },
    )
}

/// `/lm`; an empty `predictors` list lets the API pick its default model.
pub fn linear_model_section(predictors: Vec<String>, settings: TransformSettings) -> Section {
    let query = Query::new().with_all("predictors", &predictors);
    Section::new("lm", "Linear model", Endpoint::Lm, query, move |body| {
        let rows = schema::parse_lm(body)?;
        Ok(vec![Artifact::Table(regression_table(
            &rows,
            ModelKind::Linear,
            settings.significance,
        ))])
    })
}

pub fn logistic_section(settings: TransformSettings) -> Section {
    Section::new(
        "logistic",
        "Logistic regression",
        Endpoint::LogisticRegression,
        Query::new(),
        move |body| {
            let rows = schema::parse_logistic(body)?;
            Ok(vec![Artifact::Table(regression_table(
                &rows,
                ModelKind::Logistic,
                settings.significance,
            ))])
        },
    )
}

pub fn category_pred_section(var: String) -> Section {
    Section::new(
        dom_id(&["category-pred", var.as_str()]),
        format!("Predictions by {var}"),
        Endpoint::CategoryPred,
        Query::new().with("var", &var),
        move |body| {
            let categories = schema::parse_category_pred(body)?;
            Ok(vec![Artifact::Chart(residuals::category_prediction_chart(
                &var,
                &categories,
            ))])
        },
    )
}

pub fn smooth_residual_section(var: String, frac: f64, settings: TransformSettings) -> Section {
    Section::new(
        dom_id(&["smooth-residual", var.as_str()]),
        format!("Smoothed residuals for {var}"),
        Endpoint::SmoothResidual,
        Query::new().with("var", &var).with("frac", frac),
        move |body| {
            let payload = schema::parse_smooth_residual(body)?;
            Ok(vec![Artifact::Chart(residuals::smooth_residual_chart(
                &var, &payload, &settings,
            ))])
        },
    )
}

pub fn variables_section() -> Section {
    Section::new("variables", "Variables", Endpoint::Variables, Query::new(), |body| {
        let vars = schema::parse_variables(body)?;
        Ok(vec![Artifact::Table(outcomes::variable_table(&vars))])
    })
}

pub fn raw_data_section() -> Section {
    Section::new("data", data::RAW_TITLE, Endpoint::Data, Query::new(), |body| {
        let rows = schema::parse_raw_data(body)?;
        Ok(vec![Artifact::Table(data::raw_data_table(&rows))])
    })
}

/// Chart in the dashboard, table on the terminal; both come from one fetch.
pub fn mortality_section() -> Section {
    Section::new(
        "mortality",
        "Mortality by group",
        Endpoint::MortalityByGroup,
        Query::new(),
        |body| {
            let rates = schema::parse_mortality(body)?;
            Ok(vec![
                Artifact::Chart(outcomes::group_rate_chart(&rates)),
                Artifact::Table(outcomes::group_rate_table(&rates)),
            ])
        },
    )
}

pub fn calibration_section() -> Section {
    Section::new("calibration", "Calibration", Endpoint::Calibration, Query::new(), |body| {
        let points = schema::parse_calibration(body)?;
        Ok(vec![Artifact::Chart(outcomes::calibration_chart(&points))])
    })
}

pub fn column_stats_section() -> Section {
    Section::new("column-stats", "Column statistics", Endpoint::Stats, Query::new(), |body| {
        let stats = schema::parse_column_stats(body)?;
        Ok(vec![Artifact::Table(outcomes::column_stats_table(&stats))])
    })
}

// ---------------------------------------------------------------------------
// Standard dashboard
// ---------------------------------------------------------------------------

/// Every section of the standard dashboard, in display order, filtered by
/// `dashboard.include`.
pub fn dashboard_sections(config: &StatdashConfig, vars: &VariableList) -> Vec<Section> {
    let settings = TransformSettings::from(&config.analysis);
    let analysis = &config.analysis;

    let mut sections = vec![
        summary_section(Vec::new()),
        scatter_section(vars.continuous.clone(), settings),
        bins_section(vars.continuous.clone(), analysis.n_bins, settings),
        categorical_section(vars.categorical.clone(), settings),
        linear_model_section(Vec::new(), settings),
        logistic_section(settings),
    ];
    sections.extend(vars.categorical.iter().cloned().map(category_pred_section));
    sections.extend(
        vars.continuous
            .iter()
            .cloned()
            .map(|var| smooth_residual_section(var, analysis.smooth_frac, settings)),
    );
    sections.push(mortality_section());
    sections.push(calibration_section());
    sections.push(column_stats_section());

    dedupe_ids(sections.iter_mut().map(|s| &mut s.id));
    sections.retain(|s| config.dashboard.includes(&s.id));
    sections
}

// ---------------------------------------------------------------------------
// Variable discovery
// ---------------------------------------------------------------------------

/// Where the dashboard's variable lists came from.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSource {
    Configured,
    Discovered,
    /// Discovery failed; the configured lists were used.
    Fallback(String),
}

/// Variable lists for the dashboard. With `variables.discover` set, asks
/// `/variables` first and falls back to the configured lists if that call
/// fails or returns nothing.
pub fn resolve_variables<F: Fetcher + ?Sized>(
    fetcher: &F,
    config: &StatdashConfig,
) -> (VariableList, VariableSource) {
    let configured = VariableList {
        continuous: config.variables.continuous.clone(),
        categorical: config.variables.categorical.clone(),
    };
    if !config.variables.discover {
        return (configured, VariableSource::Configured);
    }

    match fetcher
        .fetch(Endpoint::Variables, &Query::new())
        .and_then(schema::parse_variables)
    {
        Ok(found) if found.continuous.is_empty() && found.categorical.is_empty() => (
            configured,
            VariableSource::Fallback("/variables returned no variables".to_string()),
        ),
        Ok(found) => (found, VariableSource::Discovered),
        Err(e) => (configured, VariableSource::Fallback(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
