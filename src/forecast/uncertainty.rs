//! Monte Carlo uncertainty intervals.
//!
//! Each simulated path adds:
//! - observation noise `N(0, σ)` on every row, with `σ` floored at a share of
//!   `max |y|` so an exact in-sample fit still carries noise
//! - on future rows only, new trend changepoints: their count is
//!   `Poisson(C * (T - 1))` where `C` is the number of fitted changepoints (at
//!   least 1) and `T` the scaled time of the last future row, locations are
//!   uniform in `(1, T)`, and magnitudes are `Laplace(0, mean |δ|)`. Without
//!   usable fitted deltas the changepoint prior scale stands in for `mean |δ|`.
//!
//! Bounds are empirical quantiles of the simulated values, widened when needed
//! so that `lower <= predicted <= upper` holds on every row.
//!
//! The RNG is seeded, so a fixed config and series give identical bounds.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal, Poisson};

use crate::domain::ForecastModel;
use crate::error::ForecastError;
use crate::math::{hinge, quantile_sorted};

/// Noise floor as a share of `max |y|`.
const NOISE_FLOOR_SHARE: f64 = 0.01;

/// Simulation settings.
#[derive(Debug, Clone, Copy)]
pub struct IntervalSettings {
    pub width: f64,
    pub samples: usize,
    pub seed: u64,
    /// Trend change scale (scaled units) used when the fit has no deltas.
    pub changepoint_prior_scale: f64,
}

/// Lower and upper bound for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

/// Simulate bounds for rows at scaled times `t` with point predictions `yhat`.
///
/// Rows with `t <= 1` are inside the history and only get observation noise.
pub fn simulate_bounds(
    model: &ForecastModel,
    t: &[f64],
    yhat: &[f64],
    settings: IntervalSettings,
) -> Result<Vec<Bounds>, ForecastError> {
    if !(settings.width.is_finite() && settings.width > 0.0 && settings.width < 1.0) {
        return Err(ForecastError::InvalidConfig(format!(
            "interval width must be in (0, 1), got {}",
            settings.width
        )));
    }
    if settings.samples == 0 {
        return Err(ForecastError::InvalidConfig(
            "uncertainty samples must be > 0".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let sigma = model.quality.sigma.max(NOISE_FLOOR_SHARE * model.y_scale);
    let noise = Normal::new(0.0, sigma).map_err(|e| ForecastError::Model(format!("noise distribution: {e}")))?;

    let t_max = t.iter().copied().fold(1.0, f64::max);
    let trend_changes = TrendChanges::new(model, t_max, settings.changepoint_prior_scale)?;

    let mut draws: Vec<Vec<f64>> = vec![Vec::with_capacity(settings.samples); t.len()];
    for _ in 0..settings.samples {
        let shifts = trend_changes.sample(&mut rng);
        for (i, (&ti, &y)) in t.iter().zip(yhat).enumerate() {
            let trend_shift: f64 = if ti > 1.0 {
                shifts.iter().map(|&(s, d)| d * hinge(ti, s)).sum::<f64>() * model.y_scale
            } else {
                0.0
            };
            draws[i].push(y + trend_shift + noise.sample(&mut rng));
        }
    }

    let q_lo = (1.0 - settings.width) / 2.0;
    let q_hi = (1.0 + settings.width) / 2.0;

    draws
        .into_iter()
        .zip(yhat)
        .map(|(mut values, &y)| {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let lo = quantile_sorted(&values, q_lo).unwrap_or(y);
            let hi = quantile_sorted(&values, q_hi).unwrap_or(y);
            if !(lo.is_finite() && hi.is_finite()) {
                return Err(ForecastError::Model("non-finite simulated bound".to_string()));
            }
            Ok(Bounds {
                lower: lo.min(y),
                upper: hi.max(y),
            })
        })
        .collect()
}

/// Distribution of future trend changepoints for one simulated path.
struct TrendChanges {
    count: Option<Poisson<f64>>,
    magnitude: Option<Exp<f64>>,
    t_max: f64,
}

impl TrendChanges {
    fn new(model: &ForecastModel, t_max: f64, prior_scale: f64) -> Result<Self, ForecastError> {
        let n_cp = model.deltas.len();
        let rate = n_cp.max(1) as f64 * (t_max - 1.0);
        let mean_abs = if n_cp > 0 {
            model.deltas.iter().map(|d| d.abs()).sum::<f64>() / n_cp as f64
        } else {
            0.0
        };
        let scale = if mean_abs > 1e-8 { mean_abs } else { prior_scale };

        if rate <= 0.0 || !rate.is_finite() || !(scale.is_finite() && scale > 0.0) {
            return Ok(Self {
                count: None,
                magnitude: None,
                t_max,
            });
        }

        let count = Poisson::new(rate).map_err(|e| ForecastError::Model(format!("changepoint rate: {e}")))?;
        let magnitude =
            Exp::new(1.0 / scale).map_err(|e| ForecastError::Model(format!("changepoint magnitude: {e}")))?;
        Ok(Self {
            count: Some(count),
            magnitude: Some(magnitude),
            t_max,
        })
    }

    /// `(location, delta)` pairs for one path.
    fn sample(&self, rng: &mut StdRng) -> Vec<(f64, f64)> {
        let (Some(count), Some(magnitude)) = (&self.count, &self.magnitude) else {
            return Vec::new();
        };
        let k = count.sample(rng) as usize;
        (0..k)
            .map(|_| {
                let location = rng.gen_range(1.0..self.t_max);
                let size = magnitude.sample(rng);
                let delta = if rng.gen_bool(0.5) { size } else { -size };
                (location, delta)
            })
            .collect()
    }
}
