//! Fetch → transform → render, one section at a time.
//!
//! A [`Section`] is plain data: which endpoint to call, with what query,
//! and how to map the JSON body into [`Artifact`]s. [`run_sections`] fetches
//! every section concurrently and returns the outcomes in declared order.
//! Sections share nothing but the fetcher, so one failing endpoint only
//! affects its own section.

pub mod sections;

use std::fmt;
use std::thread;

use serde::Serialize;
use serde_json::Value;

use crate::api::{Endpoint, FetchError, Fetcher, Query};
use crate::render::{Artifact, dedupe_ids};

pub use sections::{dashboard_sections, resolve_variables};

/// Maps a response body to render-ready artifacts.
pub type Mapper = Box<dyn Fn(Value) -> Result<Vec<Artifact>, FetchError> + Send + Sync>;

/// One dashboard region bound to one API call.
pub struct Section {
    pub id: String,
    pub title: String,
    pub endpoint: Endpoint,
    pub query: Query,
    mapper: Mapper,
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("endpoint", &self.endpoint)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        endpoint: Endpoint,
        query: Query,
        mapper: impl Fn(Value) -> Result<Vec<Artifact>, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            endpoint,
            query,
            mapper: Box::new(mapper),
        }
    }

    /// Apply the mapper to an already-fetched body.
    pub fn map(&self, body: Value) -> Result<Vec<Artifact>, FetchError> {
        (self.mapper)(body)
    }
}

/// Result of running one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "body", rename_all = "lowercase")]
pub enum SectionOutcome {
    Rendered(Vec<Artifact>),
    /// Human-readable inline error, shown in place of the section.
    Failed(String),
}

impl SectionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A section's outcome together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub id: String,
    pub title: String,
    pub outcome: SectionOutcome,
}

/// Inline message for a failed section.
pub fn failure_message(title: &str, cause: &impl fmt::Display) -> String {
    format!("Unable to load {title}: {cause}")
}

/// Fetch and map one section. Never panics on bad payloads: parse errors
/// become [`SectionOutcome::Failed`].
pub fn run_section<F: Fetcher + ?Sized>(fetcher: &F, section: &Section) -> SectionReport {
    let outcome = match fetcher
        .fetch(section.endpoint, &section.query)
        .and_then(|body| section.map(body))
    {
        Ok(artifacts) => SectionOutcome::Rendered(artifacts),
        Err(e) => SectionOutcome::Failed(failure_message(&section.title, &e)),
    };

    SectionReport {
        id: section.id.clone(),
        title: section.title.clone(),
        outcome,
    }
}

/// Run every section on its own scoped thread. Output order matches the
/// order of `sections`, whatever order the fetches complete in.
///
/// Chart ids are made unique across the whole result, since they become
/// element ids on one page.
pub fn run_sections<F: Fetcher + ?Sized>(fetcher: &F, sections: &[Section]) -> Vec<SectionReport> {
    let mut reports = thread::scope(|scope| {
        let handles: Vec<_> = sections
            .iter()
            .map(|section| scope.spawn(move || run_section(fetcher, section)))
            .collect();

        handles
            .into_iter()
            .zip(sections)
            .map(|(handle, section)| {
                handle.join().unwrap_or_else(|_| SectionReport {
                    id: section.id.clone(),
                    title: section.title.clone(),
                    outcome: SectionOutcome::Failed(failure_message(
                        &section.title,
                        &"section worker panicked",
                    )),
                })
            })
            .collect::<Vec<_>>()
    });

    let chart_ids = reports
        .iter_mut()
        .filter_map(|r| match &mut r.outcome {
            SectionOutcome::Rendered(artifacts) => Some(artifacts),
            SectionOutcome::Failed(_) => None,
        })
        .flatten()
        .filter_map(|a| match a {
            Artifact::Chart(chart) => Some(&mut chart.id),
            Artifact::Table(_) => None,
        });
    dedupe_ids(chart_ids);
    reports
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
