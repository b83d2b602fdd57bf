//! Basis functions for the trend + seasonality model.
//!
//! - trend hinge: `max(0, t - s)` lets the slope change at changepoint `s`
//! - Fourier pairs: `cos(2πk d / P)`, `sin(2πk d / P)` for `k = 1..=order`
//!
//! Seasonal terms are evaluated on absolute days since 1970-01-01 so that the
//! phase does not depend on where the history starts.

use chrono::NaiveDate;

/// Length of the yearly seasonal cycle in days.
pub const YEAR_DAYS: f64 = 365.25;

/// Continuous piecewise-linear hinge at changepoint `s`.
pub fn hinge(t: f64, s: f64) -> f64 {
    (t - s).max(0.0)
}

/// Days since the Unix epoch.
pub fn epoch_days(date: NaiveDate) -> f64 {
    // `NaiveDate::default()` is 1970-01-01.
    (date - NaiveDate::default()).num_days() as f64
}

/// Fill `out` with `[cos_1, sin_1, cos_2, sin_2, ...]` at day `day`.
///
/// # Panics
/// Panics if `out` is shorter than `2 * order`.
pub fn fourier_terms(day: f64, period: f64, order: usize, out: &mut [f64]) {
    for k in 1..=order {
        let x = 2.0 * std::f64::consts::PI * k as f64 * day / period;
        out[2 * (k - 1)] = x.cos();
        out[2 * (k - 1) + 1] = x.sin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hinge_is_zero_before_changepoint() {
        assert_eq!(hinge(0.2, 0.5), 0.0);
        assert!((hinge(0.8, 0.5) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn fourier_terms_repeat_each_period() {
        let mut a = [0.0; 6];
        let mut b = [0.0; 6];
        fourier_terms(100.0, YEAR_DAYS, 3, &mut a);
        fourier_terms(100.0 + YEAR_DAYS, YEAR_DAYS, 3, &mut b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
        // cos^2 + sin^2 = 1 for each pair.
        for k in 0..3 {
            assert!((a[2 * k].powi(2) + a[2 * k + 1].powi(2) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn epoch_days_counts_from_1970() {
        assert_eq!(epoch_days(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1.0);
    }
}
