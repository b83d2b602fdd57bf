//! Potential trend changepoint placement.
//!
//! Changepoints sit on history dates, evenly spaced over the first
//! `range` share of the history. The first date is never a changepoint (the
//! slope there is the base slope `m`).

use crate::error::ForecastError;

/// Indices into the history where the trend may bend.
///
/// With `n` history points, at most `floor(n * range) - 1` changepoints are used
/// (zero for very short histories).
pub fn changepoint_indices(n: usize, max_changepoints: usize, range: f64) -> Result<Vec<usize>, ForecastError> {
    if !(range.is_finite() && range > 0.0 && range <= 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "changepoint range must be in (0, 1], got {range}"
        )));
    }

    let hist_size = (n as f64 * range).floor() as usize;
    let count = max_changepoints.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Ok(Vec::new());
    }

    let last = (hist_size - 1) as f64;
    let step = last / count as f64;
    let mut out: Vec<usize> = (1..=count).map(|i| (step * i as f64).round() as usize).collect();
    out.dedup();
    Ok(out)
}
