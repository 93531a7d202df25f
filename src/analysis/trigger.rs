//! Short-term clustering multiplier
//!
//! A non-normalised Omori-style excitation: every recent large event adds
//! `K 10^(alpha (m - Mref)) (dt + c)^-p` to a baseline of one. It is a
//! pragmatic stand-in for an ETAS intensity, not an ETAS likelihood.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Event;
use super::shift_days;

/// Recent large event retained for the multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub time: DateTime<Utc>,
    pub magnitude: f64,
}

/// Excitation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EtasParams {
    /// Productivity
    #[serde(rename = "K")]
    pub k: f64,
    /// Magnitude scaling
    pub alpha: f64,
    /// Omori decay exponent
    pub p: f64,
    /// Omori time offset, days
    pub c: f64,
    /// Reference magnitude
    #[serde(rename = "Mref")]
    pub m_ref: f64,
}

impl Default for EtasParams {
    fn default() -> Self {
        Self {
            k: 0.05,
            alpha: 1.0,
            p: 1.0,
            c: 0.01,
            m_ref: 4.0,
        }
    }
}

/// Events of at least `min_magnitude` within `window_days` of the latest event
pub fn select_triggers(events: &[Event], window_days: f64, min_magnitude: f64) -> Vec<Trigger> {
    let Some(latest) = events.iter().map(|e| e.time).max() else {
        return Vec::new();
    };
    let since = shift_days(latest, -window_days.max(0.0));
    events
        .iter()
        .filter(|e| since.map_or(true, |s| e.time >= s) && e.magnitude >= min_magnitude)
        .map(|e| Trigger { time: e.time, magnitude: e.magnitude })
        .collect()
}

/// Rate inflation factor at `at`; exactly 1.0 with no triggers
pub fn etas_multiplier(at: DateTime<Utc>, triggers: &[Trigger], params: &EtasParams) -> f64 {
    let excitation: f64 = triggers
        .iter()
        .map(|t| {
            let dt_days = ((at - t.time).num_milliseconds() as f64 / 86_400_000.0).max(0.0);
            params.k * 10f64.powf(params.alpha * (t.magnitude - params.m_ref)) * (dt_days + params.c).powf(-params.p)
        })
        .sum();
    1.0 + excitation
}
