//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::analytics::logger;
use crate::api::Fetcher;
use crate::config::{self, StatdashConfig};
use crate::pipeline::sections::{self, VariableSource};
use crate::pipeline::{self as pipe, Section, SectionReport};
use crate::raw::{self, RawDataToggle, ToggleOutcome};
use crate::render::Table;

use super::{AppState, HttpResponse, content_type_json, not_found};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct SectionsResponse {
    /// `"configured"`, `"discovered"`, or `"fallback"`.
    variables_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovery_error: Option<String>,
    sections: Vec<SectionReport>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ToggleResponse {
    state: &'static str,
    outcome: ToggleOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConfigResponse<'a> {
    config: &'a StatdashConfig,
    toml_text: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    api_base: String,
    api_reachable: bool,
    config_exists: bool,
    log_enabled: bool,
    log_entries: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// The dashboard sections for the current config, plus where the
/// variable lists came from.
fn current_sections<F: Fetcher>(state: &AppState<F>) -> (Vec<Section>, VariableSource) {
    let (vars, source) = sections::resolve_variables(&state.fetcher, &state.config);
    (sections::dashboard_sections(&state.config, &vars), source)
}

pub(crate) fn build_sections<F: Fetcher>(state: &AppState<F>) -> SectionsResponse {
    let (dashboard, source) = current_sections(state);
    let (variables_source, discovery_error) = match source {
        VariableSource::Configured => ("configured", None),
        VariableSource::Discovered => ("discovered", None),
        VariableSource::Fallback(reason) => ("fallback", Some(reason)),
    };

    SectionsResponse {
        variables_source,
        discovery_error,
        sections: pipe::run_sections(&state.fetcher, &dashboard),
    }
}

/// Advance the raw toggle. The fetch runs with the lock released.
pub(crate) fn toggle_raw<F: Fetcher>(state: &AppState<F>) -> Result<ToggleResponse> {
    let started = lock(state)?.begin();
    let outcome = match started {
        Some(outcome) => outcome,
        None => {
            let result = raw::fetch_table(&state.fetcher);
            lock(state)?.finish(result)
        }
    };

    let toggle = lock(state)?;
    Ok(ToggleResponse {
        state: toggle.label(),
        outcome,
        table: toggle.visible_table().cloned(),
        error: toggle.last_error().map(String::from),
    })
}

fn lock<F>(state: &AppState<F>) -> Result<std::sync::MutexGuard<'_, RawDataToggle>> {
    state
        .raw
        .lock()
        .map_err(|_| anyhow::anyhow!("raw data toggle lock poisoned"))
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/sections`: every dashboard section, fetched concurrently.
pub fn get_sections<F: Fetcher>(state: &AppState<F>) -> Result<HttpResponse> {
    json_response(&build_sections(state))
}

/// `GET /api/section/<id>`: one section, or 404 for an unknown id.
pub fn get_section<F: Fetcher>(state: &AppState<F>, id: &str) -> Result<HttpResponse> {
    let (mut dashboard, _) = current_sections(state);
    dashboard.push(sections::variables_section());

    match dashboard.iter().find(|s| s.id == id) {
        Some(section) => json_response(&pipe::run_section(&state.fetcher, section)),
        None => Ok(not_found()),
    }
}

/// `POST /api/raw/toggle`: open or close the raw data table.
pub fn post_raw_toggle<F: Fetcher>(state: &AppState<F>) -> Result<HttpResponse> {
    json_response(&toggle_raw(state)?)
}

/// `GET /api/config`: current effective configuration.
pub fn get_config<F>(state: &AppState<F>) -> Result<HttpResponse> {
    let toml_text = config::show_effective_config(&state.config)?;
    json_response(&ConfigResponse {
        config: &state.config,
        toml_text,
    })
}

/// `GET /api/health`: API reachability and local status.
pub fn get_health<F: Fetcher>(state: &AppState<F>) -> Result<HttpResponse> {
    let client = crate::api::StatsClient::from_config(&state.config);
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let log_entries = state
        .config
        .logging
        .resolved_path()
        .map(|p| logger::read_all_entries(&p).len())
        .unwrap_or(0);

    json_response(&HealthResponse {
        api_base: client.base_url().to_string(),
        api_reachable: client.is_healthy(),
        config_exists,
        log_enabled: state.config.logging.enabled,
        log_entries,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Endpoint, FetchError, Query};
    use crate::pipeline::SectionOutcome;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed bodies; `/lm` always fails. Counts `/data` calls.
    struct Stub {
        data_calls: AtomicUsize,
    }

    impl Fetcher for Stub {
        fn fetch(&self, endpoint: Endpoint, _query: &Query) -> Result<Value, FetchError> {
            match endpoint {
                Endpoint::Lm => Err(FetchError::Transport {
                    url: "http://stub/lm".into(),
                    detail: "connection refused".into(),
                }),
                Endpoint::Data => {
                    self.data_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!([{"Age": 55, "Sex": "F"}]))
                }
                Endpoint::Summary => Ok(json!([
                    {"type": "categorical", "variable": "Sex", "category": "F", "count": 10, "percent": 50.0}
                ])),
                _ => Ok(json!({})),
            }
        }
    }

    fn state() -> AppState<Stub> {
        let mut config = StatdashConfig::default();
        config.dashboard.include = vec!["summary".into(), "lm".into()];
        AppState::new(
            config,
            Stub {
                data_calls: AtomicUsize::new(0),
            },
        )
    }

    #[test]
    fn sections_isolate_failures() {
        let resp = build_sections(&state());
        assert_eq!(resp.variables_source, "configured");
        assert_eq!(resp.sections.len(), 2);
        assert!(matches!(resp.sections[0].outcome, SectionOutcome::Rendered(_)));
        assert!(matches!(
            &resp.sections[1].outcome,
            SectionOutcome::Failed(m) if m.contains("connection refused")
        ));
    }

    #[test]
    fn toggle_cycles_with_one_fetch() {
        let state = state();

        let first = toggle_raw(&state).unwrap();
        assert_eq!(first.outcome, ToggleOutcome::Fetched);
        assert_eq!(first.state, "visible");
        assert!(first.table.is_some());

        let second = toggle_raw(&state).unwrap();
        assert_eq!(second.outcome, ToggleOutcome::Hidden);
        assert!(second.table.is_none());

        let third = toggle_raw(&state).unwrap();
        assert_eq!(third.outcome, ToggleOutcome::Shown);
        assert_eq!(state.fetcher.data_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn toggle_response_json_shape() {
        let json = serde_json::to_value(toggle_raw(&state()).unwrap()).unwrap();
        assert_eq!(json["state"], "visible");
        assert_eq!(json["outcome"]["result"], "fetched");
        assert_eq!(json["table"]["headers"][0], "Age");
        assert!(json.get("error").is_none());
    }
}
