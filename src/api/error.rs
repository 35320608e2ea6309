//! Fetch error taxonomy.
//!
//! Every failure at the API boundary falls into one of three buckets:
//! the request never completed, the server answered with a non-success
//! status, or the body did not match the expected schema.

use std::fmt;

use super::Endpoint;

/// Failure while retrieving or parsing one API resource.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Network or transport failure (DNS, connect, timeout, TLS).
    Transport { url: String, detail: String },
    /// The server answered with a non-2xx status.
    Status { url: String, code: u16 },
    /// The body was not JSON or did not match the endpoint's schema.
    Malformed { endpoint: Endpoint, detail: String },
}

impl FetchError {
    /// Build a [`FetchError::Malformed`] for the given endpoint.
    pub fn malformed(endpoint: Endpoint, detail: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint,
            detail: detail.into(),
        }
    }

    /// Short machine-readable category, used in the fetch log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { url, detail } => write!(f, "request to {url} failed: {detail}"),
            Self::Status { url, code } => write!(f, "{url} returned HTTP {code}"),
            Self::Malformed { endpoint, detail } => {
                write!(f, "malformed {endpoint} payload: {detail}")
            }
        }
    }
}

impl std::error::Error for FetchError {}
