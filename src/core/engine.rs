//! Model state and the forecaster that owns it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::catalog::{CatalogSource, Event};
use crate::config::ModelConfig;
use super::fit::{fit_catalog, FitResult};
use super::predict::{predict, PredictionRequest, PredictionResult};

/// Latest published fit behind a single swappable handle
///
/// Readers clone the `Arc` and keep a coherent snapshot for as long as they
/// need it. Writers build a complete `FitResult` first and swap it in; when
/// two recomputes overlap the last publish wins.
pub struct ModelState {
    current: RwLock<Arc<FitResult>>,
    version: AtomicU64,
}

impl ModelState {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(FitResult::unfit(Utc::now()))),
            version: AtomicU64::new(0),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<FitResult> {
        Arc::clone(&self.current.read())
    }

    /// Stamp a version on `fit` and make it the visible snapshot
    ///
    /// The version is taken under the write lock, so the visible version
    /// never goes backwards.
    pub fn publish(&self, mut fit: FitResult) -> Arc<FitResult> {
        let mut current = self.current.write();
        fit.version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        let fit = Arc::new(fit);
        *current = Arc::clone(&fit);
        fit
    }
}

impl Default for ModelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fits the catalog and answers forecasts from the published snapshot
pub struct Forecaster {
    source: Arc<dyn CatalogSource>,
    config: ModelConfig,
    state: ModelState,
}

impl Forecaster {
    pub fn new(source: Arc<dyn CatalogSource>, config: ModelConfig) -> Self {
        Self {
            source,
            config,
            state: ModelState::new(),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    fn load_events(&self) -> Vec<Event> {
        let mut events = self.source.events();
        if !events.windows(2).all(|w| w[0].time <= w[1].time) {
            events.sort_by_key(|e| e.time);
        }
        events
    }

    /// Refit from the full current catalog and publish the result
    pub fn recompute(&self) -> Arc<FitResult> {
        self.recompute_at(Utc::now())
    }

    /// [`recompute`](Self::recompute) with an explicit timestamp
    pub fn recompute_at(&self, now: DateTime<Utc>) -> Arc<FitResult> {
        let events = self.load_events();
        let fit = fit_catalog(&events, now, &self.config);
        let published = self.state.publish(fit);

        match (published.a, published.b, published.mc) {
            (Some(a), Some(b), Some(mc)) => info!(
                "Published fit v{}: a={:.3} b={:.3} Mc={:.2} N={} over {} events, {} triggers",
                published.version, a, b, mc, published.n, events.len(), published.triggers.len()
            ),
            _ => info!("Published unfit snapshot v{} ({} events)", published.version, events.len()),
        }
        published
    }

    /// Latest published snapshot
    pub fn status(&self) -> Arc<FitResult> {
        self.state.snapshot()
    }

    /// Forecast at the current time
    pub fn predict(&self, request: &PredictionRequest) -> PredictionResult {
        self.predict_at(request, Utc::now())
    }

    /// Forecast with the multiplier evaluated at `now`; never touches the state
    pub fn predict_at(&self, request: &PredictionRequest, now: DateTime<Utc>) -> PredictionResult {
        let fit = self.state.snapshot();
        let events = self.load_events();
        let result = predict(&events, &fit, request, now, &self.config);
        debug!(
            "Prediction at ({:.3}, {:.3}) M{:.1} over {}d: p={:.6} scope={:?}",
            request.latitude, request.longitude, request.magnitude, request.window_days,
            result.probability, result.scope
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::catalog::MemoryCatalog;
    use crate::core::{FitState, Reason};
    use crate::synthetic::SyntheticCatalog;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    fn forecaster(events: Vec<Event>) -> Forecaster {
        Forecaster::new(Arc::new(MemoryCatalog::with_events(events)), ModelConfig::default())
    }

    #[test]
    fn test_initial_state_is_unfit() {
        let f = forecaster(Vec::new());
        assert_eq!(f.status().state(), FitState::Unfit);
        assert_eq!(f.status().version, 0);
    }

    #[test]
    fn test_empty_catalog_scenario() {
        let f = forecaster(Vec::new());
        let fit = f.recompute();
        assert_eq!(fit.state(), FitState::Unfit);
        assert_eq!(f.status().state(), FitState::Unfit);

        let result = f.predict(&PredictionRequest::at(28.6, 77.2));
        assert_eq!(result.probability, 0.0);
        assert_eq!(result.reason, Some(Reason::NoData));
        assert_eq!(serde_json::to_value(result.reason).unwrap(), "no_data");
    }

    #[test]
    fn test_synthetic_box_scenario() {
        let (lat, lon) = (36.0, 138.0);
        let events = SyntheticCatalog::new(lat, lon)
            .box_km(1000.0)
            .count(1000)
            .span_years(5.0)
            .end_time(end())
            .seed(1000)
            .generate();
        let f = forecaster(events);

        let fit = f.recompute_at(end());
        assert_eq!(fit.state(), FitState::Fit);
        assert!((fit.b.unwrap() - 1.0).abs() < 0.15, "b = {:?}", fit.b);

        let request = PredictionRequest {
            magnitude: 5.5,
            window_days: 365.0,
            radius_km: 500.0,
            use_multiplier: false,
            ..PredictionRequest::at(lat, lon)
        };
        let result = f.predict_at(&request, end());
        assert!(result.probability > 0.0 && result.probability < 1.0, "p = {}", result.probability);
        assert!(result.reason.is_none());

        let with_multiplier = f.predict_at(&PredictionRequest { use_multiplier: true, ..request }, end());
        assert!(with_multiplier.probability >= result.probability && with_multiplier.probability <= 1.0);
        assert!(with_multiplier.multiplier >= 1.0);
    }

    #[test]
    fn test_large_event_trigger_scenario() {
        let query = end();
        let background = SyntheticCatalog::new(0.0, 0.0)
            .count(300)
            .b_value(1.2)
            .mc(2.5)
            .span_years(3.0)
            .end_time(query - Duration::days(60))
            .seed(77)
            .generate();
        let mut events: Vec<Event> = background.into_iter().filter(|e| e.magnitude < 4.0).collect();
        events.push(Event::new("big-one", query - Duration::days(2), 7.0, 0.1, 0.1, Some(15.0)).unwrap());
        let f = forecaster(events);

        let fit = f.recompute_at(query);
        assert_eq!(fit.triggers.len(), 1);

        let request = PredictionRequest::at(0.0, 0.0);
        let mut previous = f64::INFINITY;
        for days_later in [0, 1, 5, 20, 60] {
            let result = f.predict_at(&request, query + Duration::days(days_later));
            assert!(result.multiplier > 1.0);
            assert!(result.multiplier < previous);
            previous = result.multiplier;
        }
    }

    #[test]
    fn test_predict_does_not_mutate_state() {
        let events = SyntheticCatalog::new(0.0, 0.0).count(200).end_time(end()).seed(5).generate();
        let f = forecaster(events);
        let before = f.recompute_at(end());
        let _ = f.predict_at(&PredictionRequest::at(0.0, 0.0), end());
        let after = f.status();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_recompute_replaces_snapshot_wholesale() {
        let source = Arc::new(MemoryCatalog::new());
        let f = Forecaster::new(source.clone(), ModelConfig::default());
        let first = f.recompute_at(end());
        assert!(!first.is_fit());

        source.replace(SyntheticCatalog::new(0.0, 0.0).count(500).end_time(end()).seed(12).generate());
        let second = f.recompute_at(end());
        assert!(second.is_fit());
        assert_eq!(second.version, first.version + 1);
        assert!(!first.is_fit(), "old snapshot must stay untouched");

        source.replace(Vec::new());
        assert!(!f.recompute_at(end()).is_fit());
    }

    #[test]
    fn test_concurrent_readers_see_coherent_fits() {
        let source = Arc::new(MemoryCatalog::with_events(
            SyntheticCatalog::new(0.0, 0.0).count(300).end_time(end()).seed(21).generate(),
        ));
        let f = Arc::new(Forecaster::new(source, ModelConfig { bootstrap_samples: 50, ..ModelConfig::default() }));
        let expected = f.recompute_at(end());
        let expected_ab = expected.ab();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let f = Arc::clone(&f);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        if i % 2 == 0 {
                            f.recompute_at(end());
                        } else {
                            let fit = f.status();
                            assert_eq!(fit.ab(), expected_ab);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let last = f.status();
        assert_eq!(last.a, expected.a);
        assert_eq!(last.b, expected.b);
        assert_eq!(last.b_ci, expected.b_ci);
        assert!(last.version > expected.version);
    }

    #[test]
    fn test_visible_version_never_goes_backwards() {
        let state = Arc::new(ModelState::new());
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        state.publish(FitResult::unfit(end()));
                    }
                })
            })
            .collect();

        let mut seen = 0;
        while seen < 1000 {
            let version = state.snapshot().version;
            assert!(version >= seen, "saw v{version} after v{seen}");
            seen = version;
            if writers.iter().all(|w| w.is_finished()) {
                break;
            }
        }
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(state.snapshot().version, 1000);
    }
}
