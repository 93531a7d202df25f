//! Gutenberg-Richter b-value: Aki/Utsu maximum likelihood and bootstrap interval

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{EstimateError, EstimateResult};
use super::statistics::percentiles;

/// Minimum events at or above Mc for the MLE
pub const MIN_EVENTS_MLE: usize = 5;

/// Minimum events at or above Mc for the bootstrap
pub const MIN_EVENTS_BOOTSTRAP: usize = 10;

/// Point estimate of b
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BValueEstimate {
    pub b: f64,
    /// Analytic standard error, 2.30 b² / √n
    pub sigma: f64,
    /// Events used
    pub n: usize,
}

/// 95% bootstrap interval of b
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapInterval {
    pub low: f64,
    pub median: f64,
    pub high: f64,
}

fn above_completeness(magnitudes: &[f64], mc: f64) -> Vec<f64> {
    magnitudes.iter().copied().filter(|&m| m >= mc).collect()
}

/// b from a mean magnitude, with the dM/2 binning correction
fn b_from_mean(mean: f64, mc: f64, dm: f64) -> f64 {
    std::f64::consts::LOG10_E / (mean - mc + dm / 2.0)
}

/// Maximum-likelihood b-value of the events at or above `mc`
pub fn b_value_mle(magnitudes: &[f64], mc: f64, dm: f64) -> EstimateResult<BValueEstimate> {
    let cut = above_completeness(magnitudes, mc);
    let n = cut.len();
    if n < MIN_EVENTS_MLE {
        return Err(EstimateError::InsufficientData { needed: MIN_EVENTS_MLE, found: n });
    }

    let b = b_from_mean(cut.iter().mean(), mc, dm);
    if !b.is_finite() || b <= 0.0 {
        return Err(EstimateError::InsufficientData { needed: MIN_EVENTS_MLE, found: n });
    }
    let sigma = 2.30 * b * b / (n as f64).sqrt();

    Ok(BValueEstimate { b, sigma, n })
}

/// Percentile bootstrap (2.5, 50, 97.5) of the MLE b-value
///
/// Resample `i` draws from ChaCha8 stream `i` of `seed`, so the interval is
/// reproducible regardless of how rayon schedules the resamples.
pub fn bootstrap_b_ci(
    magnitudes: &[f64],
    mc: f64,
    dm: f64,
    n_boot: usize,
    seed: u64,
) -> EstimateResult<BootstrapInterval> {
    let cut = above_completeness(magnitudes, mc);
    let n = cut.len();
    if n < MIN_EVENTS_BOOTSTRAP {
        return Err(EstimateError::InsufficientData { needed: MIN_EVENTS_BOOTSTRAP, found: n });
    }
    if n_boot == 0 {
        return Err(EstimateError::InsufficientData { needed: 1, found: 0 });
    }

    let samples: Vec<f64> = (0..n_boot)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(i as u64);
            let sum: f64 = (0..n).map(|_| cut[rng.gen_range(0..n)]).sum();
            b_from_mean(sum / n as f64, mc, dm)
        })
        .collect();

    let p = percentiles(&samples, &[2.5, 50.0, 97.5]);
    Ok(BootstrapInterval { low: p[0], median: p[1], high: p[2] })
}
