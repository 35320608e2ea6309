//! Fetch-log reporter: per-endpoint request counts, failures and latency.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::analytics::logger::{self, FetchLogEntry};

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics for `statdash log`.
#[derive(Debug, Serialize)]
pub struct FetchStats {
    pub total_requests: usize,
    pub total_failures: usize,
    pub avg_latency_ms: f64,
    pub endpoints: Vec<EndpointStat>,
}

/// Per-endpoint aggregated statistics.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStat {
    pub endpoint: String,
    pub requests: usize,
    pub failures: usize,
    pub failure_rate: f64,
    pub avg_latency_ms: f64,
    /// Most frequent error kind among failures, if any.
    pub top_error_kind: Option<String>,
}

impl FetchStats {
    pub fn failure_pct(&self) -> f64 {
        pct(self.total_failures, self.total_requests)
    }
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

// ---------------------------------------------------------------------------
// Stats computation
// ---------------------------------------------------------------------------

/// Compute stats from the log at `path`, optionally limited to the last
/// `days` days.
pub fn compute_stats(path: &Path, days: Option<u32>) -> FetchStats {
    let entries = logger::read_entries_since_days(path, days);
    build_stats(&entries)
}

fn build_stats(entries: &[FetchLogEntry]) -> FetchStats {
    let total_requests = entries.len();
    let total_failures = entries.iter().filter(|e| !e.ok).count();
    let avg_latency_ms = average_latency(entries.iter());

    FetchStats {
        total_requests,
        total_failures,
        avg_latency_ms,
        endpoints: compute_endpoint_stats(entries),
    }
}

fn average_latency<'a>(entries: impl Iterator<Item = &'a FetchLogEntry>) -> f64 {
    let (sum, count) = entries.fold((0u64, 0usize), |(s, c), e| (s + e.latency_ms, c + 1));
    if count == 0 { 0.0 } else { sum as f64 / count as f64 }
}

/// Group entries by endpoint. Sorted by failure count, then request count,
/// both descending.
fn compute_endpoint_stats(entries: &[FetchLogEntry]) -> Vec<EndpointStat> {
    let mut groups: HashMap<&str, Vec<&FetchLogEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.endpoint.as_str()).or_default().push(entry);
    }

    let mut stats: Vec<EndpointStat> = groups
        .into_iter()
        .map(|(endpoint, group)| {
            let requests = group.len();
            let failures = group.iter().filter(|e| !e.ok).count();

            let mut kinds: HashMap<&str, usize> = HashMap::new();
            for kind in group.iter().filter_map(|e| e.error_kind.as_deref()) {
                *kinds.entry(kind).or_default() += 1;
            }
            let top_error_kind = kinds
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(kind, _)| kind.to_string());

            EndpointStat {
                endpoint: endpoint.to_string(),
                requests,
                failures,
                failure_rate: pct(failures, requests),
                avg_latency_ms: average_latency(group.iter().copied()),
                top_error_kind,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.failures
            .cmp(&a.failures)
            .then_with(|| b.requests.cmp(&a.requests))
            .then_with(|| a.endpoint.cmp(&b.endpoint))
    });

    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(endpoint: &str, ok: bool, latency_ms: u64, kind: Option<&str>) -> FetchLogEntry {
        FetchLogEntry {
            timestamp: "2025-01-15T10:00:00+00:00".to_string(),
            endpoint: endpoint.to_string(),
            url: format!("https://api{endpoint}"),
            ok,
            status: if ok { Some(200) } else { None },
            latency_ms,
            error: (!ok).then(|| "boom".to_string()),
            error_kind: kind.map(String::from),
        }
    }

    fn sample_entries() -> Vec<FetchLogEntry> {
        vec![
            entry("/summary", true, 100, None),
            entry("/summary", true, 300, None),
            entry("/lm", false, 30_000, Some("transport")),
            entry("/lm", true, 500, None),
            entry("/bins", true, 200, None),
        ]
    }

    #[test]
    fn totals() {
        let stats = build_stats(&sample_entries());
        assert_eq!(stats.total_requests, 5);
        assert_eq!(stats.total_failures, 1);
        assert!((stats.failure_pct() - 20.0).abs() < 1e-9);
        assert!((stats.avg_latency_ms - 6220.0).abs() < 1e-9);
    }

    #[test]
    fn failing_endpoint_sorts_first() {
        let stats = build_stats(&sample_entries());
        let lm = &stats.endpoints[0];
        assert_eq!(lm.endpoint, "/lm");
        assert_eq!(lm.requests, 2);
        assert!((lm.failure_rate - 50.0).abs() < 1e-9);
        assert_eq!(lm.top_error_kind.as_deref(), Some("transport"));
        assert_eq!(stats.endpoints[1].endpoint, "/summary");
        assert!((stats.endpoints[1].avg_latency_ms - 200.0).abs() < 1e-9);
    }

    #[test]
    fn empty_entries() {
        let stats = build_stats(&[]);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.failure_pct(), 0.0);
        assert!(stats.endpoints.is_empty());
    }
}
