//! Magnitude of completeness by maximum curvature
//!
//! Mc is taken as the left edge of the most populated magnitude bin. The
//! heuristic is biased low for bimodal samples and depends on the bin width;
//! it is kept because it is robust on small catalogs.

use crate::error::{EstimateError, EstimateResult};
use super::statistics::{min_max, round_to};

/// Slack for bin edges computed by repeated float addition
const EDGE_EPS: f64 = 1e-9;

/// Histograms wider than this are treated as corrupt input
pub const MAX_BINS: usize = 100_000;

/// Estimate Mc from a magnitude sample using bins of `bin_width`
///
/// Bins span `[floor(min), ceil(max)]`; the first bin with the maximum count
/// wins. The result is rounded to two decimals and kept within the sample
/// range.
pub fn max_curvature(magnitudes: &[f64], bin_width: f64) -> EstimateResult<f64> {
    let (min, max) = min_max(magnitudes).ok_or(EstimateError::EmptySample)?;
    if !(bin_width > 0.0) {
        return Err(EstimateError::EmptyHistogram);
    }

    let start = min.floor();
    let stop = max.ceil() + bin_width;
    let edges = ((stop - start) / bin_width - EDGE_EPS).ceil().max(0.0);
    if !(edges <= (MAX_BINS + 1) as f64) {
        return Err(EstimateError::EmptyHistogram);
    }
    let n_edges = edges as usize;
    if n_edges < 2 {
        return Err(EstimateError::EmptyHistogram);
    }
    let n_bins = n_edges - 1;
    let last_edge = start + n_bins as f64 * bin_width;

    let mut counts = vec![0usize; n_bins];
    for &m in magnitudes {
        if m > last_edge + EDGE_EPS {
            continue;
        }
        let idx = (((m - start) / bin_width) + EDGE_EPS).floor() as usize;
        counts[idx.min(n_bins - 1)] += 1;
    }

    let mut best = 0;
    for (idx, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = idx;
        }
    }

    let mc = round_to(start + best as f64 * bin_width, 2);
    Ok(mc.clamp(min, max))
}
