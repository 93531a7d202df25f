// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Estimator error taxonomy
//!
//! None of these are fatal. Every estimator failure has a fallback in the fit
//! pipeline or the probability engine; only a total absence of usable data
//! reaches callers, and then as a structured prediction result.

use thiserror::Error;

/// Why an estimator could not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EstimateError {
    /// The magnitude sample was empty
    #[error("empty magnitude sample")]
    EmptySample,

    /// The magnitude histogram ended up with no bins
    #[error("magnitude histogram has no bins")]
    EmptyHistogram,

    /// Too few events above the completeness threshold
    #[error("insufficient data: need at least {needed} events, found {found}")]
    InsufficientData {
        /// Minimum number of qualifying events
        needed: usize,
        /// Number actually available
        found: usize,
    },

    /// No usable Gutenberg-Richter (a, b) pair
    #[error("no usable Gutenberg-Richter fit")]
    Unfit,
}

/// Estimator result alias
pub type EstimateResult<T> = std::result::Result<T, EstimateError>;
