//! statdash: a dashboard client for a residual-diagnostics statistics API.

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod raw;
pub mod render;
pub mod transform;
pub mod web;
