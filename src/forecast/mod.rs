//! Forecast engine: fit a trend + yearly seasonality model and extrapolate.
//!
//! Responsibilities:
//!
//! - validate the training series (non-empty, strictly increasing, finite)
//! - fit the model (`fitter`)
//! - build `horizon` future monthly dates after the last observation
//! - predict every history and future date and attach simulated bounds (`uncertainty`)

pub mod changepoints;
pub mod fitter;
pub mod uncertainty;

use chrono::{Months, NaiveDate};
use tracing::info;

use crate::domain::{ForecastConfig, ForecastModel, ForecastPoint, ForecastResult, ForecastSeries, SeriesPoint};
use crate::error::ForecastError;
use crate::models::predict;

pub use fitter::fit_model;
pub use uncertainty::{Bounds, IntervalSettings, simulate_bounds};

/// Forecast table plus the model it came from.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub result: ForecastResult,
    pub model: ForecastModel,
}

/// Fit `series` and predict it plus `horizon` future months.
///
/// Fails with `InsufficientData` on an empty series and `InvalidDate` when
/// dates are not strictly increasing. Short series are accepted.
pub fn forecast(series: &ForecastSeries, horizon: usize, config: &ForecastConfig) -> Result<Forecast, ForecastError> {
    validate_series(series.points())?;
    let points = series.points();

    let model = fit_model(points, config)?;

    let mut dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    dates.extend(future_dates(dates[dates.len() - 1], horizon, points.len() - 1)?);

    let t: Vec<f64> = dates.iter().map(|&d| model.scaled_time(d)).collect();
    let yhat: Vec<f64> = dates.iter().map(|&d| predict(&model, d)).collect();
    if yhat.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::Model("non-finite prediction".to_string()));
    }

    let bounds = simulate_bounds(
        &model,
        &t,
        &yhat,
        IntervalSettings {
            width: config.interval_width,
            samples: config.uncertainty_samples,
            seed: config.seed,
            changepoint_prior_scale: config.changepoint_prior_scale,
        },
    )?;

    let n_history = points.len();
    let rows = dates
        .into_iter()
        .zip(yhat)
        .zip(bounds)
        .enumerate()
        .map(|(i, ((date, predicted_sales), b))| ForecastPoint {
            date,
            predicted_sales,
            lower_bound: b.lower,
            upper_bound: b.upper,
            is_forecast: i >= n_history,
        })
        .collect::<Vec<_>>();

    info!(
        history = n_history,
        horizon,
        seasonality = model.seasonality_enabled,
        rmse = model.quality.rmse,
        "forecast complete"
    );

    Ok(Forecast {
        result: ForecastResult { rows },
        model,
    })
}

/// `horizon` dates, one calendar month apart, after `last`.
///
/// The day of month is kept (clamped to the month's end when shorter).
pub fn future_dates(last: NaiveDate, horizon: usize, last_index: usize) -> Result<Vec<NaiveDate>, ForecastError> {
    (1..=horizon)
        .map(|k| {
            u32::try_from(k)
                .ok()
                .and_then(|k| last.checked_add_months(Months::new(k)))
                .ok_or_else(|| ForecastError::InvalidDate {
                    index: last_index,
                    reason: format!("cannot extend {last} by {k} months"),
                })
        })
        .collect()
}

fn validate_series(points: &[SeriesPoint]) -> Result<(), ForecastError> {
    if points.is_empty() {
        return Err(ForecastError::InsufficientData);
    }
    for (i, pair) in points.windows(2).enumerate() {
        if pair[1].date <= pair[0].date {
            return Err(ForecastError::InvalidDate {
                index: i + 1,
                reason: format!("{} is not after {}", pair[1].date, pair[0].date),
            });
        }
    }
    if let Some(p) = points.iter().find(|p| !p.value.is_finite()) {
        return Err(ForecastError::NonFiniteValue { date: p.date });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reference_series;
    use chrono::Datelike;

    fn months_apart(a: NaiveDate, b: NaiveDate) -> i32 {
        (b.year() - a.year()) * 12 + b.month() as i32 - a.month() as i32
    }

    #[test]
    fn twelve_months_plus_six() {
        let out = forecast(&reference_series(), 6, &ForecastConfig::default()).unwrap();
        let rows = &out.result.rows;
        assert_eq!(rows.len(), 18);
        assert_eq!(out.result.future().count(), 6);

        for pair in rows.windows(2) {
            assert!(pair[1].date > pair[0].date);
            assert_eq!(months_apart(pair[0].date, pair[1].date), 1);
        }
        for r in rows {
            assert!(r.upper_bound >= r.predicted_sales, "{r:?}");
            assert!(r.predicted_sales >= r.lower_bound, "{r:?}");
        }
        assert_eq!(rows[17].date, NaiveDate::from_ymd_opt(2019, 6, 1).unwrap());
    }

    #[test]
    fn empty_series_is_insufficient() {
        let err = forecast(&ForecastSeries::default(), 6, &ForecastConfig::default()).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData);
    }

    #[test]
    fn non_increasing_dates_are_invalid() {
        let series = ForecastSeries::parse(&[("2018-01-01", 1.0), ("2018-03-01", 2.0), ("2018-02-01", 3.0)]).unwrap();
        let err = forecast(&series, 6, &ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidDate { index: 2, .. }));

        let dup = ForecastSeries::parse(&[("2018-01-01", 1.0), ("2018-01-01", 2.0)]).unwrap();
        assert!(matches!(
            forecast(&dup, 1, &ForecastConfig::default()),
            Err(ForecastError::InvalidDate { index: 1, .. })
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let series = ForecastSeries::parse(&[("2018-01-01", 1.0), ("2018-02-01", f64::NAN)]).unwrap();
        assert!(matches!(
            forecast(&series, 1, &ForecastConfig::default()),
            Err(ForecastError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn short_series_still_forecasts() {
        let series = ForecastSeries::parse(&[("2018-01-01", 100.0)]).unwrap();
        let out = forecast(&series, 3, &ForecastConfig::default()).unwrap();
        assert_eq!(out.result.len(), 4);
        for r in &out.result.rows {
            assert!((r.predicted_sales - 100.0).abs() < 1e-6);
        }

        let series = ForecastSeries::parse(&[("2018-01-01", 100.0), ("2018-02-01", 120.0), ("2018-03-01", 130.0)]).unwrap();
        assert_eq!(forecast(&series, 6, &ForecastConfig::default()).unwrap().result.len(), 9);
    }

    #[test]
    fn two_point_history_has_open_future_intervals() {
        let series = ForecastSeries::parse(&[("2018-01-01", 1000.0), ("2018-02-01", 1100.0)]).unwrap();
        let out = forecast(&series, 6, &ForecastConfig::default()).unwrap();
        assert_eq!(out.result.len(), 8);
        for r in out.result.future() {
            assert!(r.upper_bound > r.lower_bound, "{r:?}");
        }
    }

    #[test]
    fn forced_seasonality_keeps_single_point_flat_with_width() {
        let series = ForecastSeries::parse(&[("2018-01-01", 100.0)]).unwrap();
        let config = ForecastConfig {
            seasonality: crate::domain::SeasonalityMode::On,
            ..ForecastConfig::default()
        };
        let out = forecast(&series, 6, &config).unwrap();
        for r in &out.result.rows {
            assert!((r.predicted_sales - 100.0).abs() < 1e-6, "{r:?}");
        }
        for r in out.result.future() {
            assert!(r.upper_bound > r.lower_bound, "{r:?}");
        }
    }

    #[test]
    fn forced_seasonality_on_reference_keeps_residuals_and_width() {
        let config = ForecastConfig {
            seasonality: crate::domain::SeasonalityMode::On,
            ..ForecastConfig::default()
        };
        let out = forecast(&reference_series(), 6, &config).unwrap();
        assert!(out.model.quality.rmse > 0.0);
        for r in &out.result.rows {
            assert!(r.upper_bound > r.lower_bound, "{r:?}");
        }
    }

    #[test]
    fn linear_trend_extrapolates() {
        let rows: Vec<(String, f64)> = (1..=12)
            .map(|m| (format!("2018-{m:02}-01"), 1000.0 + 100.0 * m as f64))
            .collect();
        let refs: Vec<(&str, f64)> = rows.iter().map(|(d, v)| (d.as_str(), *v)).collect();
        let series = ForecastSeries::parse(&refs).unwrap();
        let out = forecast(&series, 6, &ForecastConfig::default()).unwrap();

        let future: Vec<&ForecastPoint> = out.result.future().collect();
        for pair in future.windows(2) {
            assert!(pair[1].predicted_sales > pair[0].predicted_sales);
        }
        // June 2019 is month 18 of the line: roughly 1000 + 100 * 18.
        let last = future[5].predicted_sales;
        assert!((last - 2800.0).abs() < 150.0, "last={last}");
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let config = ForecastConfig::default();
        let a = forecast(&reference_series(), 6, &config).unwrap();
        let b = forecast(&reference_series(), 6, &config).unwrap();
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn future_dates_clamp_to_month_end() {
        let last = NaiveDate::from_ymd_opt(2019, 1, 31).unwrap();
        let dates = future_dates(last, 2, 0).unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2019, 2, 28).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2019, 3, 31).unwrap());
    }

    #[test]
    fn zero_horizon_returns_history_only() {
        let out = forecast(&reference_series(), 0, &ForecastConfig::default()).unwrap();
        assert_eq!(out.result.len(), 12);
        assert_eq!(out.result.future().count(), 0);
    }
}
