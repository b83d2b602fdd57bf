//! Fitting the trend + seasonality model to a training series.
//!
//! Given dated observations `(d_i, y_i)` we:
//! - scale time to `[0, 1]` over the history and values by `max |y|`
//! - place potential changepoints (see `changepoints`)
//! - decide whether yearly seasonality is enabled
//! - run a prior-free baseline fit to estimate the noise scale `σ0`
//! - solve the penalised (MAP) problem where each prior contributes a row with
//!   weight `σ0 / prior_scale`
//!
//! Intercept and base slope are unpenalised.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{FitQuality, ForecastConfig, ForecastModel, SeasonalityMode, SeriesPoint};
use crate::error::ForecastError;
use crate::forecast::changepoints::changepoint_indices;
use crate::math::{YEAR_DAYS, epoch_days, solve_least_squares, solve_penalized};
use crate::models::{DesignLayout, fill_design_row, predict};

/// History span (days) from which `SeasonalityMode::Auto` enables yearly terms.
const AUTO_SEASONALITY_MIN_DAYS: f64 = 2.0 * 365.0;

/// Floor on the baseline noise scale, in scaled units (1% of `max |y|`).
///
/// Prior row weights are proportional to `σ0`; an exact baseline fit must not
/// switch the priors off.
const SIGMA0_FLOOR: f64 = 0.01;

/// Fit the model to validated, strictly increasing observations.
///
/// Callers must have checked the series is non-empty with finite values.
pub fn fit_model(points: &[SeriesPoint], config: &ForecastConfig) -> Result<ForecastModel, ForecastError> {
    let Some(first) = points.first() else {
        return Err(ForecastError::InsufficientData);
    };
    let Some(last) = points.last() else {
        return Err(ForecastError::InsufficientData);
    };
    validate_priors(config)?;

    let n = points.len();
    let t_start = first.date;
    let span = (last.date - first.date).num_days() as f64;
    let t_span_days = if span > 0.0 { span } else { YEAR_DAYS };

    let y_scale = points.iter().map(|p| p.value.abs()).fold(0.0, f64::max);
    let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

    let t: Vec<f64> = points
        .iter()
        .map(|p| (p.date - t_start).num_days() as f64 / t_span_days)
        .collect();
    let days: Vec<f64> = points.iter().map(|p| epoch_days(p.date)).collect();
    let y: Vec<f64> = points.iter().map(|p| p.value / y_scale).collect();

    let (fourier_order, seasonality_reason) = resolve_seasonality(config, span, n);

    let cp_idx = changepoint_indices(n, config.n_changepoints, config.changepoint_range)?;
    let changepoints: Vec<NaiveDate> = cp_idx.iter().map(|&i| points[i].date).collect();
    let changepoints_t: Vec<f64> = cp_idx.iter().map(|&i| t[i]).collect();

    // 1) Baseline fit without changepoints or priors: noise scale estimate.
    let base_layout = DesignLayout {
        n_changepoints: 0,
        fourier_order,
    };
    let xb = design_matrix(base_layout, &t, &days, &[]);
    let yv = DVector::from_column_slice(&y);
    let base_beta = solve_least_squares(&xb, &yv)
        .ok_or_else(|| ForecastError::Model("baseline least squares failed".to_string()))?;
    let base_sse = (&xb * &base_beta - &yv).norm_squared();
    let sigma0 = (base_sse / n as f64).sqrt().max(SIGMA0_FLOOR);

    // 2) Penalised fit with changepoints.
    let layout = DesignLayout {
        n_changepoints: changepoints_t.len(),
        fourier_order,
    };
    let x = design_matrix(layout, &t, &days, &changepoints_t);
    let mut penalties = vec![0.0; layout.beta_len()];
    for p in penalties.iter_mut().take(layout.fourier_offset()).skip(2) {
        *p = sigma0 / config.changepoint_prior_scale;
    }
    for p in penalties.iter_mut().skip(layout.fourier_offset()) {
        *p = sigma0 / config.seasonality_prior_scale;
    }

    let beta = solve_penalized(&x, &yv, &penalties)
        .ok_or_else(|| ForecastError::Model("penalised least squares failed".to_string()))?;
    if beta.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::Model("non-finite coefficients".to_string()));
    }

    let off = layout.fourier_offset();
    let mut model = ForecastModel {
        t_start,
        t_span_days,
        y_scale,
        trend_intercept: beta[0],
        trend_slope: beta[1],
        changepoints,
        changepoints_t,
        deltas: beta.iter().skip(2).take(layout.n_changepoints).copied().collect(),
        fourier_order,
        seasonal_coefficients: beta.iter().skip(off).copied().collect(),
        seasonality_enabled: fourier_order > 0,
        seasonality_reason,
        quality: FitQuality {
            sse: 0.0,
            rmse: 0.0,
            sigma: 0.0,
            n,
        },
    };

    // Quality in original units.
    let sse: f64 = points
        .iter()
        .map(|p| {
            let r = p.value - predict(&model, p.date);
            r * r
        })
        .sum();
    if !sse.is_finite() {
        return Err(ForecastError::Model("non-finite residuals".to_string()));
    }
    model.quality = FitQuality {
        sse,
        rmse: (sse / n as f64).sqrt(),
        sigma: (sse / n.saturating_sub(2).max(1) as f64).sqrt(),
        n,
    };

    debug!(
        n,
        changepoints = model.changepoints.len(),
        fourier_order,
        sigma0,
        rmse = model.quality.rmse,
        "fitted forecast model"
    );

    Ok(model)
}

fn validate_priors(config: &ForecastConfig) -> Result<(), ForecastError> {
    if !(config.changepoint_prior_scale.is_finite() && config.changepoint_prior_scale > 0.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "changepoint prior scale must be finite and > 0, got {}",
            config.changepoint_prior_scale
        )));
    }
    if !(config.seasonality_prior_scale.is_finite() && config.seasonality_prior_scale > 0.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "seasonality prior scale must be finite and > 0, got {}",
            config.seasonality_prior_scale
        )));
    }
    Ok(())
}

/// Effective Fourier order and a human-readable reason.
///
/// The order is capped so that trend plus seasonal columns stay below the
/// number of points (`2 + 2K < n`); otherwise the seasonal terms alone can
/// interpolate the history.
fn resolve_seasonality(config: &ForecastConfig, span_days: f64, n: usize) -> (usize, String) {
    let requested = config.fourier_order;
    let max_order = n.saturating_sub(3) / 2;
    let order = requested.min(max_order);
    let capped = if order < requested {
        format!(", capped from {requested} for {n} points")
    } else {
        String::new()
    };

    match config.seasonality {
        SeasonalityMode::Off => (0, "disabled (--seasonality off)".to_string()),
        _ if requested == 0 => (0, "disabled (fourier order 0)".to_string()),
        SeasonalityMode::Auto if span_days < AUTO_SEASONALITY_MIN_DAYS => (
            0,
            format!("disabled (history spans {span_days:.0} days, need two years)"),
        ),
        _ if order == 0 => (0, format!("disabled (too few points: {n})")),
        SeasonalityMode::On => (order, format!("enabled (order {order}{capped})")),
        SeasonalityMode::Auto => (
            order,
            format!("enabled (order {order}{capped}, history spans {span_days:.0} days)"),
        ),
    }
}

fn design_matrix(layout: DesignLayout, t: &[f64], days: &[f64], changepoints_t: &[f64]) -> DMatrix<f64> {
    let p = layout.beta_len();
    let mut x = DMatrix::<f64>::zeros(t.len(), p);
    let mut row = vec![0.0; p];
    for i in 0..t.len() {
        fill_design_row(layout, t[i], days[i], changepoints_t, &mut row);
        for j in 0..p {
            x[(i, j)] = row[j];
        }
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    fn monthly(start: NaiveDate, values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| SeriesPoint {
                date: start + Months::new(i as u32),
                value,
            })
            .collect()
    }

    fn jan(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    #[test]
    fn linear_series_fits_exactly() {
        let values: Vec<f64> = (0..12).map(|i| 1000.0 + 50.0 * i as f64).collect();
        let points = monthly(jan(2018), &values);
        let model = fit_model(&points, &ForecastConfig::default()).unwrap();

        assert!(!model.seasonality_enabled);
        assert_eq!(model.changepoints.len(), 8);
        assert!(model.quality.rmse < 5.0, "rmse={}", model.quality.rmse);
        for p in &points {
            assert!((predict(&model, p.date) - p.value).abs() < 10.0);
        }
    }

    #[test]
    fn auto_seasonality_needs_two_years() {
        let one_year = monthly(jan(2018), &[1.0; 12]);
        let model = fit_model(&one_year, &ForecastConfig::default()).unwrap();
        assert_eq!(model.fourier_order, 0);

        let three_years = monthly(jan(2016), &[1.0; 36]);
        let model = fit_model(&three_years, &ForecastConfig::default()).unwrap();
        assert!(model.seasonality_enabled);
        assert_eq!(model.seasonal_coefficients.len(), 20);
    }

    #[test]
    fn seasonal_pattern_is_recovered() {
        // Three years of a pure yearly cycle on a flat level.
        let values: Vec<f64> = (0..36)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0;
                500.0 + 100.0 * phase.sin()
            })
            .collect();
        let points = monthly(jan(2015), &values);
        let config = ForecastConfig {
            fourier_order: 3,
            ..ForecastConfig::default()
        };
        let model = fit_model(&points, &config).unwrap();
        assert!(model.quality.rmse < 10.0, "rmse={}", model.quality.rmse);
    }

    #[test]
    fn single_point_is_flat() {
        let points = monthly(jan(2018), &[42.0]);
        let model = fit_model(&points, &ForecastConfig::default()).unwrap();
        assert!(model.changepoints.is_empty());
        let later = predict(&model, NaiveDate::from_ymd_opt(2019, 6, 1).unwrap());
        assert!((later - 42.0).abs() < 1e-6);
    }

    #[test]
    fn all_zero_series_fits() {
        let points = monthly(jan(2018), &[0.0; 6]);
        let model = fit_model(&points, &ForecastConfig::default()).unwrap();
        assert_eq!(model.y_scale, 1.0);
        assert!(model.quality.sse.abs() < 1e-12);
    }

    #[test]
    fn forced_seasonality_on_single_point_stays_flat() {
        let points = monthly(jan(2018), &[100.0]);
        let config = ForecastConfig {
            seasonality: SeasonalityMode::On,
            ..ForecastConfig::default()
        };
        let model = fit_model(&points, &config).unwrap();
        assert!(!model.seasonality_enabled);
        for m in 1..=6 {
            let later = predict(&model, jan(2018) + Months::new(m));
            assert!((later - 100.0).abs() < 1e-6, "month {m}: {later}");
        }
    }

    #[test]
    fn forced_seasonality_cannot_interpolate_one_year() {
        let config = ForecastConfig {
            seasonality: SeasonalityMode::On,
            ..ForecastConfig::default()
        };
        let series = crate::data::reference_series();
        let model = fit_model(series.points(), &config).unwrap();
        assert_eq!(model.fourier_order, 4);
        assert!(model.seasonality_reason.contains("capped from 10"));
        assert!(model.quality.rmse > 0.0, "rmse={}", model.quality.rmse);
        assert!(model.quality.sigma > 0.0);
    }

    #[test]
    fn rejects_non_positive_prior_scale() {
        let points = monthly(jan(2018), &[1.0, 2.0, 3.0]);
        let config = ForecastConfig {
            changepoint_prior_scale: 0.0,
            ..ForecastConfig::default()
        };
        assert!(matches!(
            fit_model(&points, &config),
            Err(ForecastError::InvalidConfig(_))
        ));
    }
}
