//! Gutenberg-Richter rate model and Poisson window probability

use crate::error::{EstimateError, EstimateResult};

/// Days per year used for every annualisation
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Gutenberg-Richter `a` from `n` events at or above `mc` over `years`
pub fn gutenberg_richter_a(n: usize, years: f64, b: f64, mc: f64) -> EstimateResult<f64> {
    if n == 0 || !(years > 0.0) {
        return Err(EstimateError::Unfit);
    }
    let a = (n as f64 / years).log10() + b * mc;
    if a.is_finite() {
        Ok(a)
    } else {
        Err(EstimateError::Unfit)
    }
}

/// Annual rate of events with magnitude >= `m0`, `10^(a - b m0)`
pub fn annual_rate(a: f64, b: f64, m0: f64) -> f64 {
    10f64.powf(a - b * m0)
}

/// Probability of at least one event in `window_days` for a Poisson process
///
/// Zero for a zero or negative rate or window, one for an infinite rate,
/// never NaN.
pub fn poisson_probability(rate_per_year: f64, window_days: f64) -> f64 {
    if !(rate_per_year > 0.0) || !(window_days > 0.0) {
        return 0.0;
    }
    let expected = rate_per_year * (window_days / DAYS_PER_YEAR);
    let p = -(-expected).exp_m1();
    if p.is_nan() {
        1.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
