//! The fixed 2018 monthly sales series.
//!
//! These twelve totals were used as forecast input before forecasting from the
//! computed monthly summary became the default. They remain available as an
//! explicit source (`--reference`) for comparison runs and tests.

use chrono::NaiveDate;

use crate::domain::{ForecastSeries, SeriesPoint};

/// Reference year of the built-in series.
pub const REFERENCE_YEAR: i32 = 2018;

/// Monthly sales totals, January to December.
pub const REFERENCE_SALES: [f64; 12] = [
    379_627.0, 332_495.0, 435_502.0, 596_990.0, 824_362.0, 642_501.0, 809_974.0, 664_245.0, 738_303.0,
    743_137.0, 877_881.0, 767_147.0,
];

/// The reference months, each dated on the first of the month.
pub fn reference_series() -> ForecastSeries {
    let points = REFERENCE_SALES
        .iter()
        .zip(1u32..)
        .filter_map(|(&value, month)| {
            NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, 1).map(|date| SeriesPoint { date, value })
        })
        .collect();
    ForecastSeries::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_first_of_month_points() {
        let series = reference_series();
        assert_eq!(series.len(), 12);
        assert_eq!(series.points()[0].date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(series.points()[11].date, NaiveDate::from_ymd_opt(2018, 12, 1).unwrap());
        assert_eq!(series.points()[4].value, 824_362.0);
    }
}
