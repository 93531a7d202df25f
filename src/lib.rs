// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Quakecast - Short-Term Earthquake Probability Engine
//!
//! Fits a Gutenberg-Richter model to a live earthquake catalog and answers
//! "what is the chance of an M >= M0 event within R km of this point in the
//! next T days?" with:
//! - Completeness magnitude by maximum curvature
//! - Aki/Utsu maximum-likelihood b-value with bootstrap confidence interval
//! - Window-based declustering of aftershocks
//! - Poisson probabilities, optionally boosted by Omori-style triggering
//! - Immutable fit snapshots shared between the recompute loop and readers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Quakecast Engine                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌───────────┐  ┌──────────┐  ┌────────────┐   │
//! │  │  Feeds  │→ │  Catalog  │→ │ Analysis │→ │ Forecaster │   │
//! │  │ (poll)  │  │   Store   │  │ (fit)    │  │ (predict)  │   │
//! │  └─────────┘  └───────────┘  └──────────┘  └────────────┘   │
//! │       ↑             ↑                            ↓          │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │        Scheduler: periodic + on-demand recompute     │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod feeds;
pub mod synthetic;

// Re-exports for convenience
pub use config::Config;
pub use catalog::{Catalog, CatalogSource, Event, MemoryCatalog};
pub use core::{FitResult, ForecastService, Forecaster, PredictionRequest, PredictionResult};
pub use db::CatalogStore;
pub use error::{EstimateError, EstimateResult};
pub use feeds::FeedPoller;

/// Quakecast version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
