//! Fetch log: one JSONL line per API call, and the `statdash log` report.

pub mod logger;
pub mod reporter;
