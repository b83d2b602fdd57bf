//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the cleaning/forecast pipeline
//! - prints reports
//! - writes outputs and optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::{Command, ForecastArgs, RunArgs, SummarizeArgs};
use crate::domain::{ForecastSource, PipelineConfig};
use crate::error::AppError;
use crate::report;

pub mod pipeline;

/// Entry point for the `sales` binary.
pub fn run() -> Result<(), AppError> {
    // Optional: lets SALES_* and RUST_LOG live in a local `.env`.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Summarize(args) => handle_summarize(args),
        Command::Forecast(args) => handle_forecast(args),
        Command::Run(args) => handle_run(args),
    }
}

fn init_tracing() {
    // Logs go to stderr so stdout carries only the report tables.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "sales_forecast=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn handle_summarize(args: SummarizeArgs) -> Result<(), AppError> {
    let config = args.clean.to_config();
    let ingest = crate::io::ingest::load_orders(&args.clean.input)?;
    let out = pipeline::summarize(ingest, &config);

    println!("{}", report::format_clean_report(&out.ingest, &out.cleaned.report, config.zero_sales));
    println!("{}", report::format_summary(&out.summary));
    println!("{}", report::format_correlation(&out.correlation));

    crate::io::export::write_summary_csv(&args.output, &out.summary)?;
    if let Some(path) = &args.clean.export_cleaned {
        crate::io::export::write_cleaned_csv(path, &out.cleaned.records)?;
    }
    Ok(())
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = args.model.to_config();
    let source = args.source();
    let summary = match (&args.summary, source) {
        (Some(path), ForecastSource::Summary) => crate::io::ingest::read_summary_csv(path)?,
        _ => Vec::new(),
    };

    let series = pipeline::select_series(source, &summary)?;
    let forecast = pipeline::run_forecast(&series, &config)?;

    println!("{}", report::format_model(&forecast.model, source, series.len()));
    println!("{}", report::format_forecast(&forecast.result));

    if let Some(path) = &args.output {
        crate::io::export::write_forecast_csv(path, &forecast.result)?;
    }
    if let Some(path) = &args.model.export_model {
        crate::io::model::write_model_json(path, &forecast, source)?;
    }
    Ok(())
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config: PipelineConfig = args.to_config();
    let run = pipeline::run_pipeline(&config)?;
    let s = &run.summary;

    println!("{}", report::format_clean_report(&s.ingest, &s.cleaned.report, config.clean.zero_sales));
    println!("{}", report::format_summary(&s.summary));
    println!("{}", report::format_correlation(&s.correlation));
    println!("{}", report::format_model(&run.forecast.model, run.source, run.history_len));
    println!("{}", report::format_forecast(&run.forecast.result));

    pipeline::write_outputs(&run, &config)
}
