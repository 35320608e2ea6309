/// Synchronous HTTP client for the statistics API.
///
/// Uses `ureq`. No timeout is set unless one is configured; a hosted API
/// waking from idle can take a minute. Every call is a single GET:
/// no retry, no backoff, no caching. Each completed call (success or
/// failure) is appended to the fetch log when logging is enabled.
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::{Endpoint, FetchError, Fetcher, Query};
use crate::analytics::logger;
use crate::config::StatdashConfig;

/// Timeout used by [`StatsClient::is_healthy`].
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct StatsClient {
    base_url: String,
    /// `None` waits as long as the API takes.
    timeout: Option<Duration>,
    log_path: Option<PathBuf>,
}

impl StatsClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &StatdashConfig) -> Self {
        let log_path = if config.logging.enabled {
            config.logging.resolved_path()
        } else {
            None
        };

        Self {
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            timeout: (config.api.timeout_ms > 0).then(|| Duration::from_millis(config.api.timeout_ms)),
            log_path,
        }
    }

    /// Build a client without fetch logging.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            log_path: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for an endpoint and query.
    pub fn url_for(&self, endpoint: Endpoint, query: &Query) -> String {
        if query.is_empty() {
            format!("{}{}", self.base_url, endpoint.path())
        } else {
            format!("{}{}?{}", self.base_url, endpoint.path(), query.encode())
        }
    }

    /// Issue one GET and decode the body as JSON.
    pub fn fetch_json(&self, endpoint: Endpoint, query: &Query) -> Result<Value, FetchError> {
        let url = self.url_for(endpoint, query);
        let start = Instant::now();
        let (status, result) = get_json(&url, endpoint, self.timeout);
        let latency_ms = start.elapsed().as_millis() as u64;

        if let Some(path) = &self.log_path {
            logger::log_fetch(path, endpoint, &url, status, &result, latency_ms);
        }

        result
    }

    /// Check whether the API answers `/variables` within a short timeout.
    pub fn is_healthy(&self) -> bool {
        let url = self.url_for(Endpoint::Variables, &Query::new());
        get_json(&url, Endpoint::Variables, Some(HEALTH_TIMEOUT)).1.is_ok()
    }
}

impl Fetcher for StatsClient {
    fn fetch(&self, endpoint: Endpoint, query: &Query) -> Result<Value, FetchError> {
        self.fetch_json(endpoint, query)
    }
}

/// One GET. Returns the HTTP status when a response arrived, alongside
/// the decoded body or the error.
fn get_json(
    url: &str,
    endpoint: Endpoint,
    timeout: Option<Duration>,
) -> (Option<u16>, Result<Value, FetchError>) {
    let mut request = ureq::get(url);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = match request.call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => {
            let err = FetchError::Status {
                url: url.to_string(),
                code,
            };
            return (Some(code), Err(err));
        }
        Err(ureq::Error::Transport(transport)) => {
            let err = FetchError::Transport {
                url: url.to_string(),
                detail: transport.to_string(),
            };
            return (None, Err(err));
        }
    };

    let status = response.status();
    let body = response
        .into_json::<Value>()
        .map_err(|e| FetchError::malformed(endpoint, format!("body is not valid JSON: {e}")));
    (Some(status), body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
