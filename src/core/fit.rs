//! Global fit pipeline: catalog in, immutable snapshot out

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{
    b_value_mle, bootstrap_b_ci, decluster, gutenberg_richter_a, magnitudes, max_curvature,
    select_triggers, shift_days, BootstrapInterval, Trigger, DAYS_PER_YEAR, MIN_EVENTS_MLE,
};
use crate::analysis::statistics::min_max;
use crate::catalog::Event;
use crate::config::ModelConfig;
use super::FitState;

/// Published model snapshot
///
/// Missing `a` or `b` is the unfit state, a normal outcome for sparse data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Magnitude of completeness
    #[serde(rename = "Mc")]
    pub mc: Option<f64>,
    pub b: Option<f64>,
    pub b_sigma: Option<f64>,
    pub b_ci: Option<BootstrapInterval>,
    pub a: Option<f64>,
    /// Events behind the b-value
    #[serde(rename = "N")]
    pub n: usize,
    /// Span of the fitted window, years
    pub span_years: f64,
    pub last_update: DateTime<Utc>,
    pub triggers: Vec<Trigger>,
    /// Publication counter, zero before the first publish
    pub version: u64,
}

impl FitResult {
    /// Unfit snapshot stamped at `at`
    pub fn unfit(at: DateTime<Utc>) -> Self {
        Self {
            mc: None,
            b: None,
            b_sigma: None,
            b_ci: None,
            a: None,
            n: 0,
            span_years: 0.0,
            last_update: at,
            triggers: Vec::new(),
            version: 0,
        }
    }

    pub fn state(&self) -> FitState {
        match (self.a, self.b) {
            (Some(_), Some(_)) => FitState::Fit,
            _ => FitState::Unfit,
        }
    }

    pub fn is_fit(&self) -> bool {
        self.state() == FitState::Fit
    }

    /// The Gutenberg-Richter pair, when both are known
    pub fn ab(&self) -> Option<(f64, f64)> {
        Some((self.a?, self.b?))
    }
}

/// Events within `years` of the latest event, or all of them when that is empty
fn fit_window(events: &[Event], years: f64) -> &[Event] {
    let Some(latest) = events.last().map(|e| e.time) else {
        return events;
    };
    let Some(since) = shift_days(latest, -(years * DAYS_PER_YEAR)) else {
        return events;
    };
    let start = events.partition_point(|e| e.time < since);
    if start >= events.len() {
        events
    } else {
        &events[start..]
    }
}

/// Whole days between first and last event, in years
fn span_years(events: &[Event]) -> f64 {
    match (events.first(), events.last()) {
        (Some(first), Some(last)) => (last.time - first.time).num_days() as f64 / DAYS_PER_YEAR,
        _ => 0.0,
    }
}

/// Fit the global model on a time-sorted catalog
pub fn fit_catalog(events: &[Event], now: DateTime<Utc>, config: &ModelConfig) -> FitResult {
    let mut fit = FitResult::unfit(now);
    if events.is_empty() {
        debug!("Empty catalog, model unfit");
        return fit;
    }

    let window = fit_window(events, config.fit_window_years);
    let mags = magnitudes(window);
    let Some((min_mag, _)) = min_max(&mags) else {
        return fit;
    };

    let mc = max_curvature(&mags, config.mc_bin_width).unwrap_or_else(|e| {
        debug!("Completeness estimate failed ({}), using sample minimum", e);
        min_mag
    });
    fit.mc = Some(mc);

    let declustered = decluster(window, &config.decluster);
    let declustered_mags = magnitudes(&declustered);

    let mut mags_for_b: Vec<f64> = declustered_mags.iter().copied().filter(|&m| m >= mc).collect();
    if mags_for_b.len() < MIN_EVENTS_MLE {
        debug!("Only {} declustered events above Mc, using raw sample", mags_for_b.len());
        mags_for_b = mags.iter().copied().filter(|&m| m >= mc).collect();
    }

    let estimate = match b_value_mle(&mags_for_b, mc, config.magnitude_bin_width) {
        Ok(estimate) => estimate,
        Err(e) => {
            debug!("b-value estimate failed: {}", e);
            return fit;
        }
    };

    let n_for_a = declustered_mags.iter().filter(|&&m| m >= mc).count();
    let mut years = span_years(window);
    if years <= 0.0 {
        years = config.fit_window_years;
    }

    fit.b = Some(estimate.b);
    fit.b_sigma = Some(estimate.sigma);
    fit.n = estimate.n;
    fit.span_years = years;
    fit.a = gutenberg_richter_a(n_for_a, years, estimate.b, mc).ok();
    fit.b_ci = bootstrap_b_ci(
        &mags_for_b,
        mc,
        config.magnitude_bin_width,
        config.bootstrap_samples,
        config.bootstrap_seed,
    )
    .ok();
    fit.triggers = select_triggers(events, config.trigger_window_days, config.trigger_min_magnitude);

    fit
}
