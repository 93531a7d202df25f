//! Probability engine: local or global rate, multiplier, Poisson conversion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{
    annual_rate, b_value_mle, etas_multiplier, gutenberg_richter_a, magnitudes, max_curvature,
    poisson_probability, DAYS_PER_YEAR, MIN_EVENTS_MLE,
};
use crate::analysis::statistics::min_max;
use crate::catalog::Event;
use crate::config::ModelConfig;
use super::FitResult;

/// A forecast query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Target magnitude M0
    pub magnitude: f64,
    pub window_days: f64,
    pub radius_km: f64,
    pub use_multiplier: bool,
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            magnitude: 5.5,
            window_days: 30.0,
            radius_km: 500.0,
            use_multiplier: true,
        }
    }
}

impl PredictionRequest {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, ..Self::default() }
    }
}

/// Which (a, b) produced the rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitScope {
    /// Refit on events inside the search radius
    Local,
    /// No events inside the radius, global fit used
    Global,
    /// Local refit failed on sparse data, global fit used
    GlobalFallback,
}

/// Why a prediction carries no probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Catalog is empty
    NoData,
    /// No usable (a, b) locally or globally
    Unfit,
}

/// Forecast outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub probability_pct: f64,
    /// Effective annual rate after the multiplier
    #[serde(rename = "R_yr")]
    pub rate_per_year: f64,
    pub multiplier: f64,
    pub a: Option<f64>,
    pub b: Option<f64>,
    #[serde(rename = "Mc")]
    pub mc: Option<f64>,
    #[serde(rename = "N")]
    pub n: usize,
    pub scope: Option<FitScope>,
    /// Set when sparse local data forced the global fit
    pub low_confidence: bool,
    pub reason: Option<Reason>,
    pub last_update: DateTime<Utc>,
}

impl PredictionResult {
    fn empty(reason: Reason, fit: &FitResult) -> Self {
        Self {
            probability: 0.0,
            probability_pct: 0.0,
            rate_per_year: 0.0,
            multiplier: 1.0,
            a: None,
            b: None,
            mc: fit.mc,
            n: fit.n,
            scope: None,
            low_confidence: false,
            reason: Some(reason),
            last_update: fit.last_update,
        }
    }
}

/// (a, b, Mc, N) from a refit restricted to the local subset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFit {
    pub a: f64,
    pub b: f64,
    pub mc: f64,
    pub n: usize,
}

/// Refit Gutenberg-Richter on local events, `None` when the data is too sparse
pub fn local_refit(local: &[Event], global: &FitResult, config: &ModelConfig) -> Option<LocalFit> {
    if local.len() < MIN_EVENTS_MLE {
        return None;
    }
    let mags = magnitudes(local);
    let (min_mag, _) = min_max(&mags)?;
    let mc = max_curvature(&mags, config.mc_bin_width)
        .ok()
        .or(global.mc)
        .unwrap_or(min_mag);

    let estimate = b_value_mle(&mags, mc, config.magnitude_bin_width).ok()?;

    let local_span = match (local.first(), local.last()) {
        (Some(first), Some(last)) => (last.time - first.time).num_days() as f64 / DAYS_PER_YEAR,
        _ => 0.0,
    };
    let years = [global.span_years, local_span, config.fit_window_years]
        .into_iter()
        .find(|y| *y > 0.0)?;

    let count = mags.iter().filter(|&&m| m >= mc).count();
    let a = gutenberg_richter_a(count, years, estimate.b, mc).ok()?;
    Some(LocalFit { a, b: estimate.b, mc, n: estimate.n })
}

/// Forecast for one request against a catalog and a published fit
pub fn predict(
    events: &[Event],
    fit: &FitResult,
    request: &PredictionRequest,
    now: DateTime<Utc>,
    config: &ModelConfig,
) -> PredictionResult {
    if events.is_empty() {
        return PredictionResult::empty(Reason::NoData, fit);
    }

    let local: Vec<Event> = events
        .iter()
        .filter(|e| e.distance_km(request.latitude, request.longitude) <= request.radius_km)
        .cloned()
        .collect();

    let chosen = if local.is_empty() {
        fit.ab().map(|(a, b)| (a, b, fit.mc, fit.n, FitScope::Global))
    } else {
        match local_refit(&local, fit, config) {
            Some(l) => Some((l.a, l.b, Some(l.mc), l.n, FitScope::Local)),
            None => {
                debug!("Local refit on {} events failed, falling back to global fit", local.len());
                fit.ab().map(|(a, b)| (a, b, fit.mc, fit.n, FitScope::GlobalFallback))
            }
        }
    };

    let Some((a, b, mc, n, scope)) = chosen else {
        return PredictionResult::empty(Reason::Unfit, fit);
    };

    let mut rate = annual_rate(a, b, request.magnitude);
    let mut multiplier = 1.0;
    if request.use_multiplier && !fit.triggers.is_empty() {
        multiplier = etas_multiplier(now, &fit.triggers, &config.etas);
        rate *= multiplier;
    }

    let probability = poisson_probability(rate, request.window_days);
    PredictionResult {
        probability,
        probability_pct: probability * 100.0,
        rate_per_year: rate,
        multiplier,
        a: Some(a),
        b: Some(b),
        mc,
        n,
        scope: Some(scope),
        low_confidence: scope == FitScope::GlobalFallback,
        reason: None,
        last_update: fit.last_update,
    }
}
