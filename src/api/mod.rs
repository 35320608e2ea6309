//! Client side of the read-only statistics API.
//!
//! - [`Endpoint`] names every resource the dashboard consumes.
//! - [`Query`] carries ordered, possibly repeated query parameters.
//! - [`Fetcher`] is the seam between the pipeline and the network; the
//!   production implementation is [`client::StatsClient`].
//! - [`schema`] turns raw JSON into typed payloads, rejecting malformed
//!   bodies with [`FetchError::Malformed`].

pub mod client;
pub mod error;
pub mod schema;

use std::fmt;

use serde::Serialize;
use serde_json::Value;

pub use client::StatsClient;
pub use error::FetchError;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// A resource exposed by the statistics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Summary,
    Scatter,
    Bins,
    Categorical,
    CategoryPred,
    SmoothResidual,
    Lm,
    LogisticRegression,
    Variables,
    Data,
    MortalityByGroup,
    Calibration,
    Stats,
}

impl Endpoint {
    /// URL path of the endpoint, relative to the API base.
    pub fn path(self) -> &'static str {
        match self {
            Self::Summary => "/summary",
            Self::Scatter => "/scatter",
            Self::Bins => "/bins",
            Self::Categorical => "/categorical",
            Self::CategoryPred => "/category_pred",
            Self::SmoothResidual => "/smooth_residual",
            Self::Lm => "/lm",
            Self::LogisticRegression => "/logistic_regression",
            Self::Variables => "/variables",
            Self::Data => "/data",
            Self::MortalityByGroup => "/mortality_by_group",
            Self::Calibration => "/calibration",
            Self::Stats => "/stats",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Ordered query parameters. Keys may repeat (`vars=Age&vars=LVEF`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `key=value` pair.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Append `key=value` once per value, preserving order.
    pub fn with_all<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.pairs
                .push((key.to_string(), value.as_ref().to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Percent-encoded `a=1&b=2` form, without the leading `?`.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

// ---------------------------------------------------------------------------
// Fetcher seam
// ---------------------------------------------------------------------------

/// Something that can retrieve one JSON resource from the statistics API.
///
/// Implementations must be shareable across threads: the pipeline fetches
/// independent sections concurrently.
pub trait Fetcher: Sync {
    fn fetch(&self, endpoint: Endpoint, query: &Query) -> Result<Value, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, endpoint: Endpoint, query: &Query) -> Result<Value, FetchError> {
        (**self).fetch(endpoint, query)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
