//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during cleaning, aggregation and fitting
//! - exported to CSV/JSON
//! - reloaded later (the monthly summary is read back as forecast input)

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Fixed order-date format accepted by the cleaner and series parser.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// What to do with a record whose sales is exactly zero.
///
/// Profit margin is `profit / sales * 100`, which is undefined at zero sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ZeroSalesPolicy {
    /// Drop the record (counted in the clean report).
    #[default]
    Exclude,
    /// Keep the record with an undefined margin (`None`, exported as `NaN`).
    Sentinel,
}

/// Whether the forecast model includes a yearly seasonal component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// Enable only when the history spans at least two years.
    #[default]
    Auto,
    On,
    Off,
}

/// Where the forecast training series comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    /// Monthly sales totals computed from the cleaned orders.
    #[default]
    Summary,
    /// The built-in 2018 reference months.
    Reference,
}

impl ForecastSource {
    pub fn display_name(self) -> &'static str {
        match self {
            ForecastSource::Summary => "monthly summary",
            ForecastSource::Reference => "reference series (2018)",
        }
    }
}

/// A raw order row. Every field may be missing.
///
/// Columns outside the core set are kept verbatim in `attributes` so that
/// duplicate detection sees the whole row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_date: Option<String>,
    pub aging: Option<f64>,
    pub sales: Option<f64>,
    pub quantity: Option<f64>,
    pub discount: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub order_priority: Option<String>,
    pub profit: Option<f64>,
    pub attributes: BTreeMap<String, String>,
}

impl OrderRecord {
    /// Names of the fields a record must carry to be usable.
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "aging",
        "sales",
        "quantity",
        "discount",
        "shipping_cost",
        "order_priority",
    ];

    /// First required field that is missing, if any.
    pub fn missing_required(&self) -> Option<&'static str> {
        let present = [
            self.aging.is_some(),
            self.sales.is_some(),
            self.quantity.is_some(),
            self.discount.is_some(),
            self.shipping_cost.is_some(),
            self.order_priority.is_some(),
        ];
        Self::REQUIRED_FIELDS
            .iter()
            .zip(present)
            .find_map(|(name, ok)| if ok { None } else { Some(*name) })
    }
}

/// An order row that passed validation, with derived calendar fields and margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub order_date: NaiveDate,
    pub aging: f64,
    pub sales: f64,
    pub quantity: f64,
    pub discount: f64,
    pub shipping_cost: f64,
    pub order_priority: String,
    pub profit: Option<f64>,
    pub attributes: BTreeMap<String, String>,

    /// Calendar month (1-12) of `order_date`.
    pub month: u32,
    /// Calendar year of `order_date`.
    pub year: i32,
    /// `profit / sales * 100`; `None` when profit is missing or sales is zero
    /// under [`ZeroSalesPolicy::Sentinel`].
    pub profit_margin: Option<f64>,
}

impl CleanedRecord {
    /// Turn the record back into its raw form (dates re-rendered as `YYYY-MM-DD`).
    pub fn to_order_record(&self) -> OrderRecord {
        OrderRecord {
            order_date: Some(self.order_date.format(DATE_FORMAT).to_string()),
            aging: Some(self.aging),
            sales: Some(self.sales),
            quantity: Some(self.quantity),
            discount: Some(self.discount),
            shipping_cost: Some(self.shipping_cost),
            order_priority: Some(self.order_priority.clone()),
            profit: self.profit,
            attributes: self.attributes.clone(),
        }
    }
}

/// Aggregated metrics for one calendar month.
///
/// Serialized column names match the persisted `Year,Month,Sales,Profit,Quantity` table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Sales")]
    pub sales_total: f64,
    #[serde(rename = "Profit")]
    pub profit_total: f64,
    #[serde(rename = "Quantity")]
    pub quantity_total: f64,
}

/// One training observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Ordered training input for the forecast engine.
///
/// Construction does not validate ordering; `forecast` does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    points: Vec<SeriesPoint>,
}

impl ForecastSeries {
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self { points }
    }

    /// Monthly sales totals, each dated on the first day of its month.
    pub fn from_summary(summary: &[MonthlySummary]) -> Result<Self, ForecastError> {
        let points = summary
            .iter()
            .enumerate()
            .map(|(index, row)| {
                NaiveDate::from_ymd_opt(row.year, row.month, 1)
                    .map(|date| SeriesPoint {
                        date,
                        value: row.sales_total,
                    })
                    .ok_or_else(|| ForecastError::InvalidDate {
                        index,
                        reason: format!("no calendar month {}-{}", row.year, row.month),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }

    /// Build a series from textual `YYYY-MM-DD` dates.
    pub fn parse(rows: &[(&str, f64)]) -> Result<Self, ForecastError> {
        let points = rows
            .iter()
            .enumerate()
            .map(|(index, (raw, value))| {
                NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                    .map(|date| SeriesPoint { date, value: *value })
                    .map_err(|e| ForecastError::InvalidDate {
                        index,
                        reason: format!("'{raw}': {e}"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One row of the forecast table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_sales: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// `false` for rows inside the training range. Not part of the forecast CSV.
    #[serde(default)]
    pub is_forecast: bool,
}

/// Point forecasts and intervals over history plus horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub rows: Vec<ForecastPoint>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows beyond the last training date.
    pub fn future(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.rows.iter().filter(|r| r.is_forecast)
    }
}

/// Fit quality diagnostics (original units).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    /// Residual standard deviation used for the noise simulation.
    pub sigma: f64,
    pub n: usize,
}

/// Fitted trend + seasonality parameters.
///
/// Coefficients are in scaled units: time in `[0, 1]` over the history span,
/// values divided by `y_scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastModel {
    pub t_start: NaiveDate,
    pub t_span_days: f64,
    pub y_scale: f64,
    pub trend_intercept: f64,
    pub trend_slope: f64,
    pub changepoints: Vec<NaiveDate>,
    /// Scaled changepoint locations, aligned with `changepoints`.
    pub changepoints_t: Vec<f64>,
    pub deltas: Vec<f64>,
    /// Zero when seasonality is disabled.
    pub fourier_order: usize,
    /// `[a_1, b_1, a_2, b_2, ...]` (cosine, sine pairs).
    pub seasonal_coefficients: Vec<f64>,
    pub seasonality_enabled: bool,
    pub seasonality_reason: String,
    pub quality: FitQuality,
}

impl ForecastModel {
    /// Scaled time for a calendar date.
    pub fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.t_start).num_days() as f64 / self.t_span_days
    }
}

/// Portable JSON representation of a fitted forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub source: ForecastSource,
    pub history_len: usize,
    pub horizon: usize,
    pub model: ForecastModel,
    pub forecast: ForecastResult,
}

/// Configuration for the cleaning stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanConfig {
    pub zero_sales: ZeroSalesPolicy,
}

/// Forecast model and simulation settings.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Number of future monthly periods.
    pub horizon: usize,
    pub seasonality: SeasonalityMode,
    pub fourier_order: usize,
    /// Upper bound on potential trend changepoints.
    pub n_changepoints: usize,
    /// Share of the history (from the start) in which changepoints may sit.
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    /// Coverage of the uncertainty interval, in `(0, 1)`.
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 6,
            seasonality: SeasonalityMode::Auto,
            fourier_order: 10,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 42,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub clean: CleanConfig,
    pub forecast: ForecastConfig,
    pub source: ForecastSource,

    pub summary_out: Option<PathBuf>,
    pub forecast_out: Option<PathBuf>,
    pub export_cleaned: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
}
