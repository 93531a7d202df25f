//! Analysis module - completeness, b-value, declustering, rates and triggering
//!
//! Every estimator here is a pure function over magnitude samples or event
//! slices. Failures are reported as [`EstimateError`](crate::error::EstimateError)
//! and recovered by the fit pipeline in [`crate::core`].

mod completeness;
mod bvalue;
mod decluster;
mod rate;
mod trigger;
pub mod statistics;

pub use completeness::*;
pub use bvalue::*;
pub use decluster::*;
pub use rate::*;
pub use trigger::*;

use chrono::{DateTime, Duration, Utc};

use crate::catalog::Event;

const MS_PER_DAY: f64 = 86_400_000.0;

/// `time` moved by a fractional number of days, `None` when out of range
pub fn shift_days(time: DateTime<Utc>, days: f64) -> Option<DateTime<Utc>> {
    let ms = days * MS_PER_DAY;
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    time.checked_add_signed(Duration::try_milliseconds(ms as i64)?)
}

/// Magnitudes of an event slice, in order
pub fn magnitudes(events: &[Event]) -> Vec<f64> {
    events.iter().map(|e| e.magnitude).collect()
}
