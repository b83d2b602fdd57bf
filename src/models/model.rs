//! Model evaluation for the trend + yearly seasonality forecast model.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given (scaled time, calendar day) (for least squares)
//! - predict `y(date)` from fitted coefficients (for fitted values and forecasts)
//!
//! Coefficient layout: `[k, m, δ_1..δ_C, a_1, b_1, ..., a_K, b_K]`.

use chrono::NaiveDate;

use crate::domain::ForecastModel;
use crate::math::{YEAR_DAYS, epoch_days, fourier_terms, hinge};

/// Shape of the design matrix for one fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignLayout {
    pub n_changepoints: usize,
    pub fourier_order: usize,
}

impl DesignLayout {
    /// Number of linear coefficients.
    pub fn beta_len(self) -> usize {
        2 + self.n_changepoints + 2 * self.fourier_order
    }

    /// Index of the first seasonal coefficient.
    pub fn fourier_offset(self) -> usize {
        2 + self.n_changepoints
    }
}

/// Fill a design row: intercept, slope, changepoint hinges, then Fourier pairs.
///
/// # Panics
/// Panics if `out.len() != layout.beta_len()` or `changepoints_t` does not have
/// `layout.n_changepoints` entries.
pub fn fill_design_row(layout: DesignLayout, t: f64, day: f64, changepoints_t: &[f64], out: &mut [f64]) {
    out[0] = 1.0;
    out[1] = t;
    for (j, &s) in changepoints_t.iter().enumerate() {
        out[2 + j] = hinge(t, s);
    }
    let off = layout.fourier_offset();
    fourier_terms(day, YEAR_DAYS, layout.fourier_order, &mut out[off..]);
}

/// Trend component at scaled time `t` (scaled units).
pub fn trend(model: &ForecastModel, t: f64) -> f64 {
    let bends: f64 = model
        .changepoints_t
        .iter()
        .zip(&model.deltas)
        .map(|(&s, &d)| d * hinge(t, s))
        .sum();
    model.trend_intercept + model.trend_slope * t + bends
}

/// Seasonal component at a calendar day (scaled units).
pub fn seasonal(model: &ForecastModel, day: f64) -> f64 {
    if model.fourier_order == 0 {
        return 0.0;
    }
    let mut terms = vec![0.0; 2 * model.fourier_order];
    fourier_terms(day, YEAR_DAYS, model.fourier_order, &mut terms);
    terms
        .iter()
        .zip(&model.seasonal_coefficients)
        .map(|(x, c)| x * c)
        .sum()
}

/// Predict `y(date)` in original units.
pub fn predict(model: &ForecastModel, date: NaiveDate) -> f64 {
    let t = model.scaled_time(date);
    model.y_scale * (trend(model, t) + seasonal(model, epoch_days(date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitQuality;

    fn linear_model() -> ForecastModel {
        ForecastModel {
            t_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            t_span_days: 100.0,
            y_scale: 10.0,
            trend_intercept: 1.0,
            trend_slope: 2.0,
            changepoints: vec![NaiveDate::from_ymd_opt(2020, 2, 20).unwrap()],
            changepoints_t: vec![0.5],
            deltas: vec![-2.0],
            fourier_order: 0,
            seasonal_coefficients: vec![],
            seasonality_enabled: false,
            seasonality_reason: "off".to_string(),
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                sigma: 0.0,
                n: 0,
            },
        }
    }

    #[test]
    fn trend_bends_at_changepoint() {
        let m = linear_model();
        assert!((trend(&m, 0.25) - 1.5).abs() < 1e-12);
        // Slope 2 then 0 after t = 0.5.
        assert!((trend(&m, 0.5) - 2.0).abs() < 1e-12);
        assert!((trend(&m, 0.9) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn predict_scales_back_to_original_units() {
        let m = linear_model();
        let y = predict(&m, NaiveDate::from_ymd_opt(2020, 1, 26).unwrap());
        assert!((y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn design_row_layout() {
        let layout = DesignLayout {
            n_changepoints: 1,
            fourier_order: 2,
        };
        let mut row = vec![0.0; layout.beta_len()];
        fill_design_row(layout, 0.75, 18_000.0, &[0.5], &mut row);
        assert_eq!(row[0], 1.0);
        assert_eq!(row[1], 0.75);
        assert!((row[2] - 0.25).abs() < 1e-12);
        assert_eq!(row.len(), 7);
    }
}
