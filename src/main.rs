use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use statdash::api::StatsClient;
use statdash::cli::{self, OutputFormat};
use statdash::config;
use statdash::pipeline::sections;
use statdash::transform::TransformSettings;
use statdash::web;

#[derive(Debug, Parser)]
#[command(name = "statdash")]
#[command(about = "Residual diagnostics dashboard for a remote statistics API")]
struct App {
    /// Override the API base URL for this invocation
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Descriptive statistics
    Summary {
        /// Restrict to these variables (repeatable)
        #[arg(long = "vars")]
        vars: Vec<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Pearson residuals against each continuous predictor
    Scatter {
        #[arg(long)]
        var: Option<String>,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Residuals grouped into bins of a continuous predictor
    Bins {
        #[arg(long)]
        var: Option<String>,
        /// Number of bins (default from config)
        #[arg(long)]
        n_bins: Option<u32>,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Residuals grouped by a categorical predictor
    Categorical {
        #[arg(long)]
        var: Option<String>,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Predicted vs observed outcome per category
    CategoryPred {
        #[arg(long)]
        var: String,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Binned means and a smoothed residual curve
    SmoothResidual {
        #[arg(long)]
        var: String,
        /// Smoother span (default from config)
        #[arg(long)]
        frac: Option<f64>,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Linear regression coefficients
    Lm {
        /// Predictors to include (repeatable)
        #[arg(long = "predictors")]
        predictors: Vec<String>,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Logistic regression odds ratios
    Logistic {
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Continuous and categorical variable names known to the API
    Variables {
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// The raw dataset
    Data {
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Outcome rate per group
    Mortality {
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Predicted vs observed probability
    Calibration {
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Mean and standard deviation per column
    ColumnStats {
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Write the full dashboard as a static HTML file
    Report {
        #[arg(long, default_value = "statdash-report.html")]
        output: PathBuf,
        /// Also embed the raw data table
        #[arg(long)]
        include_data: bool,
    },
    /// Serve the interactive dashboard
    Serve {
        /// Listen address (default from config)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Check API reachability, config and fetch log
    Health,
    /// Per-endpoint fetch statistics from the fetch log
    Log {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a key, e.g. `analysis.n_bins 12`
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    let mut config = config::load();
    if let Some(base) = app.api_base {
        config.api.base_url = base;
    }
    let settings = TransformSettings::from(&config.analysis);
    let client = StatsClient::from_config(&config);
    let fmt = |format: &str| OutputFormat::from_str_opt(Some(format));

    match app.command {
        Commands::Summary { vars, format } => {
            cli::run_section(&client, &sections::summary_section(vars), fmt(&format))
        }
        Commands::Scatter { var, format } => {
            let section = sections::scatter_section(var.into_iter().collect(), settings);
            cli::run_section(&client, &section, fmt(&format))
        }
        Commands::Bins { var, n_bins, format } => {
            let n_bins = n_bins.unwrap_or(config.analysis.n_bins);
            let section = sections::bins_section(var.into_iter().collect(), n_bins, settings);
            cli::run_section(&client, &section, fmt(&format))
        }
        Commands::Categorical { var, format } => {
            let section = sections::categorical_section(var.into_iter().collect(), settings);
            cli::run_section(&client, &section, fmt(&format))
        }
        Commands::CategoryPred { var, format } => {
            cli::run_section(&client, &sections::category_pred_section(var), fmt(&format))
        }
        Commands::SmoothResidual { var, frac, format } => {
            let frac = frac.unwrap_or(config.analysis.smooth_frac);
            let section = sections::smooth_residual_section(var, frac, settings);
            cli::run_section(&client, &section, fmt(&format))
        }
        Commands::Lm { predictors, format } => {
            let section = sections::linear_model_section(predictors, settings);
            cli::run_section(&client, &section, fmt(&format))
        }
        Commands::Logistic { format } => {
            cli::run_section(&client, &sections::logistic_section(settings), fmt(&format))
        }
        Commands::Variables { format } => {
            cli::run_section(&client, &sections::variables_section(), fmt(&format))
        }
        Commands::Data { format } => {
            cli::run_section(&client, &sections::raw_data_section(), fmt(&format))
        }
        Commands::Mortality { format } => {
            cli::run_section(&client, &sections::mortality_section(), fmt(&format))
        }
        Commands::Calibration { format } => {
            cli::run_section(&client, &sections::calibration_section(), fmt(&format))
        }
        Commands::ColumnStats { format } => {
            cli::run_section(&client, &sections::column_stats_section(), fmt(&format))
        }
        Commands::Report {
            output,
            include_data,
        } => cli::run_report(&config, &output, include_data),
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            web::serve(config, &addr)
        }
        Commands::Health => cli::run_health(&config),
        Commands::Log { days, format } => cli::run_log(&config, days, fmt(&format)),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(&config),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
