//! Core module - fit pipeline, probability engine, model state and scheduling

mod engine;
mod fit;
mod predict;
mod scheduler;
mod service;

pub use engine::{Forecaster, ModelState};
pub use fit::{fit_catalog, FitResult};
pub use predict::{local_refit, predict, FitScope, LocalFit, PredictionRequest, PredictionResult, Reason};
pub use scheduler::Scheduler;
pub use service::ForecastService;

use serde::{Deserialize, Serialize};

/// Whether the published snapshot carries a usable (a, b)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitState {
    Unfit,
    Fit,
}
