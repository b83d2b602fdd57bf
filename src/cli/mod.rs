//! Command-line parsing for the sales pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! cleaning/forecasting code: args convert into the typed configs in `domain`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    CleanConfig, ForecastConfig, ForecastSource, PipelineConfig, SeasonalityMode, ZeroSalesPolicy,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sales", version, about = "Order cleaning, monthly summary and sales forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean an orders CSV and write the monthly summary.
    Summarize(SummarizeArgs),
    /// Forecast monthly sales from a summary CSV or the reference series.
    Forecast(ForecastArgs),
    /// Clean, summarize and forecast in one pass.
    Run(RunArgs),
}

/// Cleaning options shared by `summarize` and `run`.
#[derive(Debug, Args, Clone)]
pub struct CleanArgs {
    /// Orders CSV.
    #[arg(long, env = "SALES_INPUT", value_name = "CSV")]
    pub input: PathBuf,

    /// How to treat rows with zero sales when computing profit margin.
    #[arg(long, value_enum, default_value_t = ZeroSalesPolicy::Exclude)]
    pub zero_sales: ZeroSalesPolicy,

    /// Export cleaned records (with Month, Year, Profit_Margin) to CSV.
    #[arg(long = "export-cleaned", value_name = "CSV")]
    pub export_cleaned: Option<PathBuf>,
}

/// Model and simulation options shared by `forecast` and `run`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Number of future months to predict.
    #[arg(long, env = "SALES_HORIZON", default_value_t = 6)]
    pub horizon: usize,

    /// Yearly seasonality (auto enables it for histories of two years or more).
    #[arg(long, value_enum, default_value_t = SeasonalityMode::Auto)]
    pub seasonality: SeasonalityMode,

    /// Fourier order of the yearly seasonality.
    #[arg(long, default_value_t = 10)]
    pub fourier_order: usize,

    /// Maximum number of potential trend changepoints.
    #[arg(long, default_value_t = 25)]
    pub changepoints: usize,

    /// Prior scale for trend changes (smaller is stiffer).
    #[arg(long, default_value_t = 0.05)]
    pub changepoint_prior_scale: f64,

    /// Random seed for the uncertainty simulation.
    #[arg(long, env = "SALES_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Number of simulated paths for the intervals.
    #[arg(long, default_value_t = 1000)]
    pub samples: usize,

    /// Interval coverage in (0, 1).
    #[arg(long, default_value_t = 0.8)]
    pub interval_width: f64,

    /// Export the fitted model and forecast to JSON.
    #[arg(long = "export-model", value_name = "JSON")]
    pub export_model: Option<PathBuf>,
}

/// Options for `sales summarize`.
#[derive(Debug, Args, Clone)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub clean: CleanArgs,

    /// Monthly summary CSV.
    #[arg(long, short = 'o', value_name = "CSV", default_value = "monthly_summary.csv")]
    pub output: PathBuf,
}

/// Options for `sales forecast`.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Monthly summary CSV produced by `sales summarize`.
    #[arg(long, value_name = "CSV", conflicts_with = "reference", required_unless_present = "reference")]
    pub summary: Option<PathBuf>,

    /// Use the built-in 2018 reference series instead of a summary.
    #[arg(long)]
    pub reference: bool,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Forecast CSV.
    #[arg(long, short = 'o', value_name = "CSV")]
    pub output: Option<PathBuf>,
}

/// Options for `sales run`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub clean: CleanArgs,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Series to forecast.
    #[arg(long, value_enum, default_value_t = ForecastSource::Summary)]
    pub source: ForecastSource,

    /// Monthly summary CSV.
    #[arg(long = "summary-out", value_name = "CSV")]
    pub summary_out: Option<PathBuf>,

    /// Forecast CSV.
    #[arg(long = "forecast-out", value_name = "CSV")]
    pub forecast_out: Option<PathBuf>,
}

impl CleanArgs {
    pub fn to_config(&self) -> CleanConfig {
        CleanConfig {
            zero_sales: self.zero_sales,
        }
    }
}

impl ModelArgs {
    pub fn to_config(&self) -> ForecastConfig {
        ForecastConfig {
            horizon: self.horizon,
            seasonality: self.seasonality,
            fourier_order: self.fourier_order,
            n_changepoints: self.changepoints,
            changepoint_prior_scale: self.changepoint_prior_scale,
            interval_width: self.interval_width,
            uncertainty_samples: self.samples,
            seed: self.seed,
            ..ForecastConfig::default()
        }
    }
}

impl ForecastArgs {
    pub fn source(&self) -> ForecastSource {
        if self.reference {
            ForecastSource::Reference
        } else {
            ForecastSource::Summary
        }
    }
}

impl RunArgs {
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            input: self.clean.input.clone(),
            clean: self.clean.to_config(),
            forecast: self.model.to_config(),
            source: self.source,
            summary_out: self.summary_out.clone(),
            forecast_out: self.forecast_out.clone(),
            export_cleaned: self.clean.export_cleaned.clone(),
            export_model: self.model.export_model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_forecast_config() {
        let cli = parse(&["sales", "run", "--input", "orders.csv"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.to_config();
        let defaults = ForecastConfig::default();
        assert_eq!(config.input, PathBuf::from("orders.csv"));
        assert_eq!(config.source, ForecastSource::Summary);
        assert_eq!(config.clean.zero_sales, ZeroSalesPolicy::Exclude);
        assert_eq!(config.forecast.horizon, defaults.horizon);
        assert_eq!(config.forecast.seed, defaults.seed);
        assert_eq!(config.forecast.uncertainty_samples, defaults.uncertainty_samples);
        assert_eq!(config.forecast.n_changepoints, defaults.n_changepoints);
    }

    #[test]
    fn forecast_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["sales", "forecast"]).is_err());
        assert!(Cli::try_parse_from(["sales", "forecast", "--summary", "s.csv", "--reference"]).is_err());

        let cli = parse(&["sales", "forecast", "--reference", "--horizon", "3", "--seasonality", "off"]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.source(), ForecastSource::Reference);
        assert_eq!(args.model.to_config().horizon, 3);
        assert_eq!(args.model.to_config().seasonality, SeasonalityMode::Off);
    }

    #[test]
    fn summarize_accepts_sentinel_policy() {
        let cli = parse(&["sales", "summarize", "--input", "o.csv", "--zero-sales", "sentinel"]);
        let Command::Summarize(args) = cli.command else {
            panic!("expected summarize");
        };
        assert_eq!(args.clean.to_config().zero_sales, ZeroSalesPolicy::Sentinel);
        assert_eq!(args.output, PathBuf::from("monthly_summary.csv"));
    }
}
