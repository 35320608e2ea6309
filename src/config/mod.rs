/// Configuration system for statdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::StatdashConfig::default()`]
/// 2. **User global config**: `~/.statdash/config.toml`
/// 3. **Project local config**: `.statdash.toml` in the current working directory
/// 4. **Environment variables**: `STATDASH_*` overrides
///
/// The `--api-base` command-line flag is applied on top by `main`.
///
/// Layers are merged key by key: a file that sets only `analysis.n_bins`
/// leaves every other value from the earlier layers in place.
///
/// # Usage
///
/// ```rust,ignore
/// use statdash::config;
///
/// let cfg = config::load();
/// let client = statdash::api::StatsClient::from_config(&cfg);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::StatdashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved statdash configuration.
///
/// Merges defaults → global TOML → project TOML → env vars.
pub fn load() -> StatdashConfig {
    let mut config = StatdashConfig::default();

    if let Some(path) = global_config_path() {
        config = apply_file_layer(config, &path);
    }
    if let Some(path) = project_config_path() {
        config = apply_file_layer(config, &path);
    }

    apply_env_overrides(&mut config);
    config
}

/// Merge one TOML file over `base`.
///
/// A missing, unreadable, or malformed file leaves `base` unchanged so a
/// bad project file never stops the dashboard from starting.
fn apply_file_layer(base: StatdashConfig, path: &Path) -> StatdashConfig {
    let Ok(content) = fs::read_to_string(path) else {
        return base;
    };
    merge_toml_str(&base, &content).unwrap_or(base)
}

/// Deep-merge a TOML document over an existing config.
fn merge_toml_str(base: &StatdashConfig, overlay: &str) -> Option<StatdashConfig> {
    let overlay: toml::Value = toml::from_str(overlay).ok()?;
    let mut merged = toml::Value::try_from(base).ok()?;
    merge_values(&mut merged, overlay);
    merged.try_into().ok()
}

/// Recursively overlay `overlay` onto `base`. Tables merge per key; any
/// other value replaces the base value wholesale.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.statdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".statdash").join("config.toml"))
}

/// Path to the project local config: `.statdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".statdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `STATDASH_API_BASE`: API base URL
/// - `STATDASH_TIMEOUT_MS`: request timeout (`0` for none)
/// - `STATDASH_N_BINS`: `n_bins` for `/bins`
/// - `STATDASH_DISCOVER`: fetch variable lists from `/variables`
/// - `STATDASH_LOGGING`: fetch log on/off (`1`/`true`/`yes`/`on`)
/// - `STATDASH_ADDR`: dashboard listen address
fn apply_env_overrides(config: &mut StatdashConfig) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

/// Override logic with the variable lookup injected, so tests need not
/// touch the process environment.
fn apply_overrides(config: &mut StatdashConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("STATDASH_API_BASE")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Some(val) = var("STATDASH_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = var("STATDASH_N_BINS")
        && let Ok(n) = val.parse::<u32>()
        && n > 0
    {
        config.analysis.n_bins = n;
    }
    if let Some(val) = var("STATDASH_DISCOVER") {
        config.variables.discover = is_truthy(&val);
    }
    if let Some(val) = var("STATDASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Some(val) = var("STATDASH_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.statdash/config.toml`.
///
/// Returns an error if the file already exists and `force` is false.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.statdash/ directory")?;
    }

    fs::write(&path, StatdashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `analysis.n_bins`. When no file exists yet the
/// defaults are written out first; an existing partial file only gains the
/// key being set.
pub fn set_config_value(key: &str, value: &str) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::try_from(StatdashConfig::default())
            .context("failed to serialize default config")?
    };

    set_toml_value(&mut root, key, value)?;

    // Reject values that would make the file unloadable.
    let _: StatdashConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(path)
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value takes the type of the existing one, or of the built-in
/// default when the file leaves the key out. Missing tables are created,
/// so a partial config file stays partial. Arrays are given as
/// comma-separated lists and keep the element type of the existing array.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let defaults = toml::Value::try_from(StatdashConfig::default())
        .context("failed to serialize default config")?;

    let (section, leaf) = match key.rsplit_once('.') {
        Some((section, leaf)) => (Some(section), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    let mut template = Some(&defaults);
    if let Some(section) = section {
        for part in section.split('.') {
            template = template.and_then(|t| t.get(part));
            let table = current
                .as_table_mut()
                .with_context(|| format!("expected table above '{part}' in '{key}'"))?;
            if !table.contains_key(part) && template.is_none() {
                anyhow::bail!("config key not found: section '{part}' in '{key}'");
            }
            current = table
                .entry(part.to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        }
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{}'", section.unwrap_or("")))?;

    let existing = table
        .get(leaf)
        .or_else(|| template.and_then(|t| t.get(leaf)))
        .with_context(|| format!("config key not found: '{key}'"))?;
    let new_value = parse_like(existing, key, raw_value)?;

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

fn parse_like(existing: &toml::Value, key: &str, raw: &str) -> Result<toml::Value> {
    Ok(match existing {
        toml::Value::Boolean(_) => toml::Value::Boolean(is_truthy(raw)),
        toml::Value::Integer(_) => {
            let n: i64 = raw
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw}'"))?;
            toml::Value::Integer(n)
        }
        toml::Value::Float(_) => {
            let f: f64 = raw
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw}'"))?;
            toml::Value::Float(f)
        }
        toml::Value::Array(items) => {
            let element = items.first();
            let values = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| match element {
                    Some(e) => parse_like(e, key, s),
                    None => Ok(toml::Value::String(s.to_string())),
                })
                .collect::<Result<Vec<_>>>()?;
            toml::Value::Array(values)
        }
        _ => toml::Value::String(raw.to_string()),
    })
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config(config: &StatdashConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn file_layer_merges_per_key() {
        let base = StatdashConfig::default();
        let merged = merge_toml_str(
            &base,
            r#"
[analysis]
n_bins = 6

[variables]
continuous = ["Age"]
"#,
        )
        .unwrap();
        assert_eq!(merged.analysis.n_bins, 6);
        assert!((merged.analysis.significance - 0.05).abs() < f64::EPSILON);
        assert_eq!(merged.variables.continuous, vec!["Age"]);
        assert_eq!(merged.variables.categorical, base.variables.categorical);
    }

    #[test]
    fn later_layer_keeps_earlier_overrides() {
        let global = merge_toml_str(&StatdashConfig::default(), "[api]\ntimeout_ms = 5000\n").unwrap();
        let project = merge_toml_str(&global, "[analysis]\nn_bins = 4\n").unwrap();
        assert_eq!(project.api.timeout_ms, 5000);
        assert_eq!(project.analysis.n_bins, 4);
    }

    #[test]
    fn malformed_layer_is_ignored() {
        let base = StatdashConfig::default();
        assert!(merge_toml_str(&base, "[analysis]\nn_bins = \"many\"\n").is_none());
        assert!(merge_toml_str(&base, "not toml [").is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("STATDASH_API_BASE", "http://localhost:8000"),
            ("STATDASH_TIMEOUT_MS", "1500"),
            ("STATDASH_N_BINS", "0"),
            ("STATDASH_LOGGING", "off"),
            ("STATDASH_DISCOVER", "yes"),
        ]
        .into_iter()
        .collect();

        let mut config = StatdashConfig::default();
        apply_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_ms, 1500);
        // Zero bins is rejected
        assert_eq!(config.analysis.n_bins, 10);
        assert!(!config.logging.enabled);
        assert!(config.variables.discover);
        assert_eq!(config.server.addr, "127.0.0.1:9747");
    }

    #[test]
    fn set_toml_value_updates_typed_values() {
        let mut root = toml::Value::try_from(StatdashConfig::default()).unwrap();
        set_toml_value(&mut root, "analysis.n_bins", "8").unwrap();
        set_toml_value(&mut root, "analysis.significance", "0.01").unwrap();
        set_toml_value(&mut root, "logging.enabled", "false").unwrap();
        set_toml_value(&mut root, "api.base_url", "http://localhost:8000").unwrap();
        set_toml_value(&mut root, "variables.continuous", "Age, LVEF").unwrap();
        set_toml_value(&mut root, "analysis.residual_range", "-3, 3").unwrap();

        let config: StatdashConfig = root.try_into().unwrap();
        assert_eq!(config.analysis.n_bins, 8);
        assert!((config.analysis.significance - 0.01).abs() < f64::EPSILON);
        assert!(!config.logging.enabled);
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.variables.continuous, vec!["Age", "LVEF"]);
        assert_eq!(config.analysis.residual_range, [-3.0, 3.0]);
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root = toml::Value::try_from(StatdashConfig::default()).unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "analysis.unknown", "1").is_err());
        assert!(set_toml_value(&mut root, "analysis.n_bins", "ten").is_err());
    }

    #[test]
    fn set_toml_value_fills_partial_file() {
        let mut root: toml::Value = toml::from_str("[analysis]\nn_bins = 6\n").unwrap();
        set_toml_value(&mut root, "api.base_url", "http://localhost:8000").unwrap();
        set_toml_value(&mut root, "analysis.significance", "0.01").unwrap();
        set_toml_value(&mut root, "server.open_browser", "no").unwrap();

        assert_eq!(root["api"]["base_url"].as_str(), Some("http://localhost:8000"));
        assert_eq!(root["analysis"]["n_bins"].as_integer(), Some(6));
        assert_eq!(root["analysis"]["significance"].as_float(), Some(0.01));
        assert_eq!(root["server"]["open_browser"].as_bool(), Some(false));
        assert!(root.get("logging").is_none());

        let merged = merge_toml_str(&StatdashConfig::default(), &toml::to_string(&root).unwrap())
            .unwrap();
        assert_eq!(merged.api.base_url, "http://localhost:8000");
        assert_eq!(merged.analysis.n_bins, 6);
    }

    #[test]
    fn set_toml_value_rejects_unknown_key_in_partial_file() {
        let mut root: toml::Value = toml::from_str("[analysis]\nn_bins = 6\n").unwrap();
        assert!(set_toml_value(&mut root, "nope.key", "1").is_err());
        assert!(set_toml_value(&mut root, "api.unknown", "1").is_err());
        assert!(root.get("nope").is_none());
    }

    #[test]
    fn show_effective_config_round_trips() {
        let config = StatdashConfig::default();
        let toml_str = show_effective_config(&config).unwrap();
        let parsed: StatdashConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
