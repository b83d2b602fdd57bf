//! Shared pipeline logic used by the `summarize`, `forecast` and `run` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> clean -> aggregate (+ correlation) -> series selection -> forecast -> exports
//!
//! The commands can then focus on presentation.

use tracing::{info, warn};

use crate::aggregate::{CorrelationMatrix, aggregate, correlation};
use crate::clean::{CleanOutcome, clean};
use crate::data::reference_series;
use crate::domain::{
    CleanConfig, ForecastConfig, ForecastSeries, ForecastSource, MonthlySummary, PipelineConfig,
};
use crate::error::AppError;
use crate::forecast::{Forecast, forecast};
use crate::io::ingest::{IngestedOrders, load_orders};

/// Cleaning and aggregation outputs.
#[derive(Debug, Clone)]
pub struct SummaryOutput {
    pub ingest: IngestedOrders,
    pub cleaned: CleanOutcome,
    pub summary: Vec<MonthlySummary>,
    pub correlation: CorrelationMatrix,
}

/// All computed outputs of a single `sales run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub summary: SummaryOutput,
    pub source: ForecastSource,
    pub history_len: usize,
    pub forecast: Forecast,
}

/// Execute the full pipeline on the configured input file.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let ingest = load_orders(&config.input)?;
    run_pipeline_on(ingest, config)
}

/// Execute the pipeline on already-ingested orders.
pub fn run_pipeline_on(ingest: IngestedOrders, config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let summary = summarize(ingest, &config.clean);
    let series = select_series(config.source, &summary.summary)?;
    let history_len = series.len();
    let forecast = run_forecast(&series, &config.forecast)?;

    Ok(RunOutput {
        summary,
        source: config.source,
        history_len,
        forecast,
    })
}

/// Clean ingested orders and reduce them to the monthly summary.
pub fn summarize(ingest: IngestedOrders, config: &CleanConfig) -> SummaryOutput {
    let cleaned = clean(&ingest.records, config);
    let summary = aggregate(&cleaned.records);
    let correlation = correlation(&summary);
    SummaryOutput {
        ingest,
        cleaned,
        summary,
        correlation,
    }
}

/// The training series for `source`.
///
/// An empty summary is an insufficient-data failure (exit code 3).
pub fn select_series(source: ForecastSource, summary: &[MonthlySummary]) -> Result<ForecastSeries, AppError> {
    match source {
        ForecastSource::Reference => {
            info!("forecasting the built-in reference series");
            Ok(reference_series())
        }
        ForecastSource::Summary => {
            if summary.is_empty() {
                warn!("monthly summary is empty");
                return Err(AppError::new(
                    3,
                    "No monthly summary rows to forecast (did any orders survive cleaning?).",
                ));
            }
            Ok(ForecastSeries::from_summary(summary)?)
        }
    }
}

/// Fit and extrapolate `series` by `config.horizon` months.
pub fn run_forecast(series: &ForecastSeries, config: &ForecastConfig) -> Result<Forecast, AppError> {
    Ok(forecast(series, config.horizon, config)?)
}

/// Write every output the config asks for.
pub fn write_outputs(run: &RunOutput, config: &PipelineConfig) -> Result<(), AppError> {
    if let Some(path) = &config.summary_out {
        crate::io::export::write_summary_csv(path, &run.summary.summary)?;
    }
    if let Some(path) = &config.forecast_out {
        crate::io::export::write_forecast_csv(path, &run.forecast.result)?;
    }
    if let Some(path) = &config.export_cleaned {
        crate::io::export::write_cleaned_csv(path, &run.summary.cleaned.records)?;
    }
    if let Some(path) = &config.export_model {
        crate::io::model::write_model_json(path, &run.forecast, run.source)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderRecord;
    use std::path::PathBuf;

    fn order(date: &str, sales: f64) -> OrderRecord {
        OrderRecord {
            order_date: Some(date.to_string()),
            aging: Some(1.0),
            sales: Some(sales),
            quantity: Some(1.0),
            discount: Some(0.0),
            shipping_cost: Some(1.0),
            order_priority: Some("Medium".to_string()),
            profit: Some(sales / 10.0),
            ..OrderRecord::default()
        }
    }

    fn ingest(records: Vec<OrderRecord>) -> IngestedOrders {
        IngestedOrders {
            rows_read: records.len(),
            records,
            row_errors: vec![],
            attribute_columns: vec![],
        }
    }

    fn config(source: ForecastSource) -> PipelineConfig {
        PipelineConfig {
            input: PathBuf::from("unused.csv"),
            clean: CleanConfig::default(),
            forecast: ForecastConfig {
                uncertainty_samples: 200,
                ..ForecastConfig::default()
            },
            source,
            summary_out: None,
            forecast_out: None,
            export_cleaned: None,
            export_model: None,
        }
    }

    #[test]
    fn forecasts_from_summary_by_default() {
        let records: Vec<OrderRecord> = (1..=6).map(|m| order(&format!("2020-{m:02}-15"), 100.0 * m as f64)).collect();
        let out = run_pipeline_on(ingest(records), &config(ForecastSource::Summary)).unwrap();
        assert_eq!(out.summary.summary.len(), 6);
        assert_eq!(out.history_len, 6);
        assert_eq!(out.forecast.result.len(), 12);
    }

    #[test]
    fn empty_summary_is_insufficient_data() {
        let out = run_pipeline_on(ingest(vec![order("not a date", 1.0)]), &config(ForecastSource::Summary));
        assert_eq!(out.unwrap_err().exit_code(), 3);
    }

    #[test]
    fn reference_source_ignores_summary() {
        let out = run_pipeline_on(ingest(vec![]), &config(ForecastSource::Reference)).unwrap();
        assert!(out.summary.summary.is_empty());
        assert_eq!(out.history_len, 12);
        assert_eq!(out.forecast.result.len(), 18);
    }
}
