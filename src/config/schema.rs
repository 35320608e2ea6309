/// Configuration schema and defaults for statdash.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[api]`, `[variables]`, `[analysis]`, `[dashboard]`, `[server]` and
/// `[logging]`.
///
/// Every field has a built-in default matching the hosted API, so an empty
/// file (or no file at all) yields a working dashboard.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Base URL of the hosted statistics API.
pub const DEFAULT_API_BASE: &str = "https://stats-api-nh00.onrender.com";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level statdash configuration.
///
/// Maps directly to the `~/.statdash/config.toml` and `.statdash.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatdashConfig {
    pub api: ApiConfig,
    pub variables: VariablesConfig,
    pub analysis: AnalysisConfig,
    pub dashboard: DashboardConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` means no timeout: the
    /// API's own response time is the only bound.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [variables]
// ---------------------------------------------------------------------------

/// Predictor lists the dashboard renders sections for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariablesConfig {
    pub continuous: Vec<String>,
    pub categorical: Vec<String>,
    /// Ask `/variables` for the lists instead, falling back to the lists
    /// above when that call fails.
    pub discover: bool,
}

impl Default for VariablesConfig {
    fn default() -> Self {
        Self {
            continuous: ["Age", "LVEF", "aus"].map(String::from).to_vec(),
            categorical: ["Sex", "NYHA", "urgency", "surgery", "diabetes", "CKD"]
                .map(String::from)
                .to_vec(),
            discover: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [analysis]
// ---------------------------------------------------------------------------

/// Query parameters and display thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// `n_bins` sent to `/bins`.
    pub n_bins: u32,
    /// `frac` sent to `/smooth_residual`.
    pub smooth_frac: f64,
    /// Fixed y-axis range on residual charts.
    pub residual_range: [f64; 2],
    /// p-value threshold for highlighting regression terms.
    pub significance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_bins: 10,
            smooth_frac: 0.3,
            residual_range: [-4.0, 4.0],
            significance: 0.05,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Which sections the report and web dashboard show.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Section id prefixes to keep (`"scatter"`, `"category-pred"`, ...).
    /// Empty keeps every section.
    pub include: Vec<String>,
}

impl DashboardConfig {
    pub fn includes(&self, section_id: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|p| section_id.starts_with(p.as_str()))
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `statdash serve`.
    pub addr: String,
    /// Open the dashboard in the default browser after binding.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Fetch log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether each API call is appended to the fetch log.
    pub enabled: bool,
    /// Path to the JSONL fetch log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.statdash/fetch-log.jsonl".to_string(),
        }
    }
}

impl LoggingConfig {
    /// The log path with a leading `~` expanded. `None` when the home
    /// directory cannot be determined.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        expand_home(&self.path)
    }
}

fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl StatdashConfig {
    /// Annotated default config written by `statdash config init`.
    pub fn default_toml() -> String {
        r#"# statdash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. --api-base flag
#   2. Environment variables (STATDASH_*)
#   3. Project config (.statdash.toml in current directory)
#   4. User global config (~/.statdash/config.toml)
#   5. Built-in defaults

[api]
base_url = "https://stats-api-nh00.onrender.com"
timeout_ms = 0                        # Per request; 0 = wait for the API. No retries

[variables]
continuous = ["Age", "LVEF", "aus"]
categorical = ["Sex", "NYHA", "urgency", "surgery", "diabetes", "CKD"]
discover = false                      # Ask /variables first, fall back to the lists above

[analysis]
n_bins = 10
smooth_frac = 0.3
residual_range = [-4.0, 4.0]
significance = 0.05

[dashboard]
include = []                          # Section id prefixes, e.g. ["summary", "scatter"]; empty = all

[server]
addr = "127.0.0.1:9747"
open_browser = true

[logging]
enabled = true
path = "~/.statdash/fetch-log.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
