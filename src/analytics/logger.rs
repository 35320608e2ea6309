use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{Endpoint, FetchError};

// ---------------------------------------------------------------------------
// Fetch log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the fetch log (`~/.statdash/fetch-log.jsonl`).
///
/// One line per API call, successful or not. Read back by `statdash log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLogEntry {
    pub timestamp: String,
    /// Endpoint path, e.g. `"/summary"`.
    pub endpoint: String,
    pub url: String,
    pub ok: bool,
    /// HTTP status when a response arrived.
    #[serde(default)]
    pub status: Option<u16>,
    pub latency_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
    /// `"transport"`, `"status"`, or `"malformed"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl FetchLogEntry {
    /// `status` is the HTTP status of the response, if one arrived.
    pub fn from_result(
        endpoint: Endpoint,
        url: &str,
        status: Option<u16>,
        result: &Result<Value, FetchError>,
        latency_ms: u64,
    ) -> Self {
        let (ok, status, error, error_kind) = match result {
            Ok(_) => (true, status, None, None),
            Err(e) => (
                false,
                status.or_else(|| e.status_code()),
                Some(e.to_string()),
                Some(e.kind().to_string()),
            ),
        };

        Self {
            timestamp: Utc::now().to_rfc3339(),
            endpoint: endpoint.path().to_string(),
            url: url.to_string(),
            ok,
            status,
            latency_ms,
            error,
            error_kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append one fetch result to the log at `path`. Best effort: I/O errors
/// are ignored so logging never fails a fetch.
pub fn log_fetch(
    path: &Path,
    endpoint: Endpoint,
    url: &str,
    status: Option<u16>,
    result: &Result<Value, FetchError>,
    latency_ms: u64,
) {
    let entry = FetchLogEntry::from_result(endpoint, url, status, result, latency_ms);
    let _ = append_log_entry(path, &entry);
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all fetch log entries.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries(path: &Path) -> Vec<FetchLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    let reader = BufReader::new(file);
    reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<FetchLogEntry>(&line).ok())
        .collect()
}

/// Read log entries filtered to a time window (last N days).
///
/// If `days` is `None`, returns all entries.
pub fn read_entries_since_days(path: &Path, days: Option<u32>) -> Vec<FetchLogEntry> {
    let entries = read_all_entries(path);

    let Some(days) = days else {
        return entries;
    };

    let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
    let cutoff_str = cutoff.to_rfc3339();

    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff_str)
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_log_entry(path: &Path, entry: &FetchLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_entry() {
        let entry = FetchLogEntry::from_result(
            Endpoint::Summary,
            "https://api/summary",
            Some(200),
            &Ok(json!([])),
            120,
        );
        assert!(entry.ok);
        assert_eq!(entry.endpoint, "/summary");
        assert_eq!(entry.status, Some(200));
        assert!(entry.error.is_none());
    }

    #[test]
    fn failure_entry_keeps_kind() {
        let err = FetchError::Status {
            url: "https://api/lm".into(),
            code: 503,
        };
        let entry = FetchLogEntry::from_result(Endpoint::Lm, "https://api/lm", None, &Err(err), 40);
        assert!(!entry.ok);
        assert_eq!(entry.status, Some(503));
        assert_eq!(entry.error_kind.as_deref(), Some("status"));
    }

    #[test]
    fn transport_failure_has_no_status() {
        let err = FetchError::Transport {
            url: "https://api/data".into(),
            detail: "connection refused".into(),
        };
        let entry = FetchLogEntry::from_result(Endpoint::Data, "https://api/data", None, &Err(err), 3);
        assert_eq!(entry.status, None);
        assert_eq!(entry.error_kind.as_deref(), Some("transport"));
    }

    #[test]
    fn append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("fetch.jsonl");

        log_fetch(&path, Endpoint::Bins, "u1", Some(200), &Ok(json!({})), 10);
        let err = FetchError::malformed(Endpoint::Bins, "bad");
        log_fetch(&path, Endpoint::Bins, "u2", Some(203), &Err(err), 20);

        // A stray line is skipped on read.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();

        let entries = read_all_entries(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].url, "u2");
        assert_eq!(entries[1].error_kind.as_deref(), Some("malformed"));
        assert_eq!(entries[1].status, Some(203));
        assert_eq!(read_entries_since_days(&path, Some(1)).len(), 2);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_all_entries(&dir.path().join("absent.jsonl")).is_empty());
    }
}
