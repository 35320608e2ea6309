//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - single-endpoint views (`statdash summary`, `statdash lm`, ...)
//! - `statdash report`: static HTML dashboard
//! - `statdash health`: API reachability, config and fetch-log status
//! - `statdash log --days N`: per-endpoint fetch statistics
//! - `statdash config show|init|set|reset`: configuration management

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;

use crate::analytics::logger;
use crate::analytics::reporter::{self, FetchStats};
use crate::api::{Fetcher, StatsClient};
use crate::config::{self, StatdashConfig};
use crate::pipeline::sections::{self, VariableSource};
use crate::pipeline::{self as pipe, Section, SectionOutcome, SectionReport};
use crate::render::{Artifact, html, terminal};

/// Output format for single-endpoint and log commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Single-endpoint views
// ---------------------------------------------------------------------------

/// Fetch one section and print it. A failed fetch is returned as an error
/// so the process exits non-zero.
pub fn run_section<F: Fetcher + ?Sized>(fetcher: &F, section: &Section, format: OutputFormat) -> Result<()> {
    let report = pipe::run_section(fetcher, section);
    let artifacts = match report.outcome {
        SectionOutcome::Rendered(artifacts) => artifacts,
        SectionOutcome::Failed(message) => anyhow::bail!(message),
    };

    print!("{}", render_artifacts(&report.title, &artifacts, format)?);
    Ok(())
}

fn render_artifacts(title: &str, artifacts: &[Artifact], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => {
            format!("{}\n", serde_json::to_string_pretty(artifacts).context("failed to serialize output")?)
        }
        OutputFormat::Csv => artifacts
            .iter()
            .map(terminal::artifact_csv)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Table => {
            let mut out = format!("{}\n{}\n", title.bold().cyan(), "=".repeat(60));
            if artifacts.is_empty() {
                out.push_str(&format!("{}\n", "No data returned.".yellow()));
            }
            for artifact in artifacts {
                out.push('\n');
                out.push_str(&terminal::format_artifact(artifact));
            }
            out
        }
    })
}

// ---------------------------------------------------------------------------
// statdash report
// ---------------------------------------------------------------------------

/// Fetch every dashboard section and write a self-contained HTML page.
pub fn run_report(config: &StatdashConfig, output: &Path, include_data: bool) -> Result<()> {
    let client = StatsClient::from_config(config);
    let (vars, source) = sections::resolve_variables(&client, config);
    if let VariableSource::Fallback(reason) = &source {
        eprintln!(
            "{} variable discovery failed ({reason}); using configured lists",
            "warning:".yellow().bold()
        );
    }

    let dashboard = sections::dashboard_sections(config, &vars);
    println!(
        "Fetching {} sections from {}",
        dashboard.len(),
        client.base_url().bold()
    );
    let reports = pipe::run_sections(&client, &dashboard);
    let raw = include_data.then(|| pipe::run_section(&client, &sections::raw_data_section()).outcome);

    let subtitle = format!(
        "{} · generated {}",
        client.base_url(),
        Local::now().format("%Y-%m-%d %H:%M")
    );
    let page = html::report_page("Residual diagnostics", &subtitle, &reports, raw.as_ref());

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("failed to create output directory")?;
    }
    fs::write(output, page).with_context(|| format!("failed to write {}", output.display()))?;

    print_report_summary(&reports);
    println!(
        "{} Report written to {}",
        "✓".green().bold(),
        output.display()
    );
    Ok(())
}

fn print_report_summary(reports: &[SectionReport]) {
    for report in reports {
        match &report.outcome {
            SectionOutcome::Rendered(artifacts) => println!(
                "  {} {:<32} {}",
                "✓".green().bold(),
                terminal::truncate(&report.title, 32),
                format!("{} item(s)", artifacts.len()).dimmed()
            ),
            SectionOutcome::Failed(message) => println!(
                "  {} {:<32} {}",
                "✗".red().bold(),
                terminal::truncate(&report.title, 32),
                message.dimmed()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// statdash health
// ---------------------------------------------------------------------------

/// Check API reachability, config files and the fetch log.
pub fn run_health(config: &StatdashConfig) -> Result<()> {
    println!("{}", "statdash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.statdash/config.toml found"
        } else {
            "not found (run `statdash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".statdash.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = StatsClient::from_config(config);
    let api_ok = client.is_healthy();
    let api_detail = if api_ok {
        format!("reachable at {}", client.base_url())
    } else {
        format!("{} not reachable (hosted instances may need a minute to wake)", client.base_url())
    };
    print_health_item("Statistics API", api_ok, &api_detail);
    print_health_item(
        "Variables",
        true,
        &format!(
            "{} continuous, {} categorical{}",
            config.variables.continuous.len(),
            config.variables.categorical.len(),
            if config.variables.discover { " (discovery on)" } else { "" }
        ),
    );

    match config.logging.resolved_path() {
        Some(path) if config.logging.enabled => {
            let entries = logger::read_all_entries(&path);
            let exists = path.exists();
            print_health_item(
                "Fetch log",
                exists,
                &if exists {
                    format!("{} entries", entries.len())
                } else {
                    "no log file yet".to_string()
                },
            );
        }
        _ => print_health_item("Fetch log", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// statdash log
// ---------------------------------------------------------------------------

/// Summarize the fetch log per endpoint.
pub fn run_log(config: &StatdashConfig, days: Option<u32>, format: OutputFormat) -> Result<()> {
    let path = config
        .logging
        .resolved_path()
        .context("could not determine fetch log path")?;
    let stats = reporter::compute_stats(&path, days);

    if stats.total_requests == 0 {
        println!(
            "{}",
            "No fetches logged yet. Run a command against the API to see stats.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_log_csv(&stats),
        OutputFormat::Table => print_log_table(&stats, days),
    }

    Ok(())
}

fn print_log_table(stats: &FetchStats, days: Option<u32>) {
    let heading = match days {
        Some(d) => format!("Fetch Log (last {d} days)"),
        None => "Fetch Log".to_string(),
    };
    println!("{}", heading.bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Requests:    ".bold(), stats.total_requests);
    println!(
        "  {} {} ({:.1}%)",
        "Failures:    ".bold(),
        stats.total_failures,
        stats.failure_pct()
    );
    println!("  {} {:.0} ms", "Avg latency: ".bold(), stats.avg_latency_ms);
    println!();

    println!(
        "  {:<24} {:>8} {:>8} {:>8} {:>10}",
        "Endpoint", "Requests", "Failed", "Rate", "Latency"
    );
    println!("  {}", "-".repeat(62));
    for (i, e) in stats.endpoints.iter().enumerate() {
        let line = format!(
            "  {:<24} {:>8} {:>8} {:>7.1}% {:>8.0}ms",
            terminal::truncate(&e.endpoint, 24),
            e.requests,
            e.failures,
            e.failure_rate,
            e.avg_latency_ms,
        );
        if e.failures > 0 {
            println!("{}", line.red());
        } else if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_log_csv(stats: &FetchStats) {
    println!("endpoint,requests,failures,failure_rate,avg_latency_ms,top_error_kind");
    for e in &stats.endpoints {
        println!(
            "{},{},{},{:.1},{:.1},{}",
            e.endpoint,
            e.requests,
            e.failures,
            e.failure_rate,
            e.avg_latency_ms,
            e.top_error_kind.as_deref().unwrap_or(""),
        );
    }
}

// ---------------------------------------------------------------------------
// statdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show(config: &StatdashConfig) -> Result<()> {
    let toml_str = config::show_effective_config(config)?;
    println!("{}", "Effective statdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.statdash/config.toml");
    print_source(project_exists, ".statdash.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "STATDASH_* environment variables".dimmed()
    );
    println!("  {} {}", "·".dimmed(), "--api-base flag".dimmed());

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.statdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point at another API or change variables.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    let path = config::set_config_value(key, value)?;
    println!(
        "{} Set {} = {} in {}",
        "✓".green().bold(),
        key.bold(),
        value,
        path.display()
    );
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
