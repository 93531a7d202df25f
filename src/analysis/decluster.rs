//! Window-based declustering
//!
//! Single forward pass in the spirit of Gardner-Knopoff: every kept event
//! opens a space-time window scaled by its magnitude and removes the smaller
//! or equal events that fall inside it. Order dependent, no iteration.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Event;
use super::shift_days;

/// Space-time window parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclusterWindows {
    /// Magnitude at which windows start scaling
    pub scaling_magnitude: f64,
    /// Reference magnitude subtracted before scaling
    pub reference_magnitude: f64,
    /// Time window below `scaling_magnitude`, days
    pub base_days: f64,
    /// Days per magnitude unit above the reference
    pub days_per_magnitude: f64,
    /// Distance window below `scaling_magnitude`, km
    pub base_km: f64,
    /// Km per magnitude unit above the reference
    pub km_per_magnitude: f64,
}

impl Default for DeclusterWindows {
    fn default() -> Self {
        Self {
            scaling_magnitude: 5.0,
            reference_magnitude: 4.0,
            base_days: 7.0,
            days_per_magnitude: 14.0,
            base_km: 50.0,
            km_per_magnitude: 100.0,
        }
    }
}

impl DeclusterWindows {
    /// Time window for an initiating event, in days
    pub fn time_days(&self, magnitude: f64) -> f64 {
        if magnitude < self.scaling_magnitude {
            self.base_days
        } else {
            self.days_per_magnitude * (magnitude - self.reference_magnitude)
        }
    }

    /// Distance window for an initiating event, in km
    pub fn distance_km(&self, magnitude: f64) -> f64 {
        if magnitude < self.scaling_magnitude {
            self.base_km
        } else {
            self.km_per_magnitude * (magnitude - self.reference_magnitude)
        }
    }
}

/// Keep the background events of a sample, time-sorted
pub fn decluster(events: &[Event], windows: &DeclusterWindows) -> Vec<Event> {
    let mut sorted = events.to_vec();
    if !sorted.windows(2).all(|w| w[0].time <= w[1].time) {
        sorted.sort_by_key(|e| e.time);
    }

    let mut removed = vec![false; sorted.len()];
    let mut kept = Vec::with_capacity(sorted.len());

    for i in 0..sorted.len() {
        if removed[i] {
            continue;
        }
        let initiator = &sorted[i];
        // unbounded when the window runs past the representable range
        let horizon = shift_days(initiator.time, windows.time_days(initiator.magnitude));
        let radius = windows.distance_km(initiator.magnitude);

        for j in (i + 1)..sorted.len() {
            if removed[j] {
                continue;
            }
            let candidate = &sorted[j];
            if horizon.is_some_and(|h| candidate.time > h) {
                break;
            }
            if candidate.magnitude <= initiator.magnitude
                && candidate.distance_km(initiator.latitude, initiator.longitude) <= radius
            {
                removed[j] = true;
            }
        }
        kept.push(initiator.clone());
    }

    debug!("Declustered {} events down to {}", sorted.len(), kept.len());
    kept
}
