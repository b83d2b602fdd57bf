//! Mathematical utilities: basis functions, least squares and sample quantiles.

pub mod basis;
pub mod ols;

pub use basis::*;
pub use ols::*;

/// Linear-interpolated quantile of an ascending-sorted slice (`q` in `[0, 1]`).
///
/// Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
