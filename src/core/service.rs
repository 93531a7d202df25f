//! Async service: periodic recompute plus bounded-wait freshness for predictions

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SchedulerConfig;
use super::{FitResult, Forecaster, PredictionRequest, PredictionResult, Scheduler};

/// Owns the recurring recompute and serves reads from the published snapshot
///
/// A prediction only triggers work when the snapshot is older than
/// `max_snapshot_age_secs`. Concurrent stale requests share one recompute
/// and wait at most `recompute_wait_ms` for it.
pub struct ForecastService {
    forecaster: Arc<Forecaster>,
    config: SchedulerConfig,
    scheduler: Scheduler,
    refresh_gate: Arc<Mutex<()>>,
}

impl ForecastService {
    pub fn new(forecaster: Arc<Forecaster>, config: SchedulerConfig) -> Self {
        Self {
            forecaster,
            config,
            scheduler: Scheduler::new(),
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn forecaster(&self) -> &Arc<Forecaster> {
        &self.forecaster
    }

    /// Register and start the periodic recompute task
    pub async fn start(&self, shutdown: &broadcast::Sender<()>) -> Vec<JoinHandle<()>> {
        let forecaster = Arc::clone(&self.forecaster);
        self.scheduler
            .add_task("recompute", Duration::from_secs(self.config.recompute_interval_secs.max(1)), move || {
                forecaster.recompute();
            })
            .await;
        self.scheduler.start(shutdown).await
    }

    fn is_stale(&self) -> bool {
        snapshot_is_stale(&self.forecaster, self.config.max_snapshot_age_secs)
    }

    /// Recompute if the snapshot is stale, waiting no longer than the configured bound
    ///
    /// The gate stays locked until the recompute itself finishes, even when
    /// this caller has stopped waiting, so later stale callers queue on it and
    /// then find a fresh snapshot.
    pub async fn ensure_fresh(&self) {
        if !self.is_stale() {
            return;
        }
        let wait = Duration::from_millis(self.config.recompute_wait_ms);
        let gate = Arc::clone(&self.refresh_gate);
        let forecaster = Arc::clone(&self.forecaster);
        let max_age = self.config.max_snapshot_age_secs;

        let refresh = async move {
            let guard = gate.lock_owned().await;
            if !snapshot_is_stale(&forecaster, max_age) {
                return;
            }
            forecaster.source().request_refresh();
            let running = tokio::task::spawn_blocking(move || {
                let _guard = guard;
                forecaster.recompute();
            });
            if let Err(e) = running.await {
                warn!("On-demand recompute failed: {}", e);
            }
        };
        if tokio::time::timeout(wait, refresh).await.is_err() {
            debug!("Recompute still running after {:?}, answering from current snapshot", wait);
        }
    }

    /// Forecast from a snapshot no older than the freshness bound when possible
    pub async fn predict(&self, request: &PredictionRequest) -> PredictionResult {
        self.ensure_fresh().await;
        self.forecaster.predict(request)
    }

    /// Latest published snapshot, without triggering work
    pub fn status(&self) -> Arc<FitResult> {
        self.forecaster.status()
    }
}

/// Nothing published yet, or the snapshot is older than `max_age_secs`
fn snapshot_is_stale(forecaster: &Forecaster, max_age_secs: u64) -> bool {
    let max_age = chrono::Duration::seconds(max_age_secs.min(i64::MAX as u64 / 1000) as i64);
    let snapshot = forecaster.status();
    snapshot.version == 0 || Utc::now() - snapshot.last_update > max_age
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::catalog::{CatalogSource, Event, MemoryCatalog};
    use crate::config::ModelConfig;
    use crate::core::FitState;
    use crate::synthetic::SyntheticCatalog;

    fn service(max_age: u64) -> ForecastService {
        let source = Arc::new(MemoryCatalog::with_events(
            SyntheticCatalog::new(0.0, 0.0).count(300).seed(3).generate(),
        ));
        let model = ModelConfig { bootstrap_samples: 50, ..ModelConfig::default() };
        let forecaster = Arc::new(Forecaster::new(source, model));
        let config = SchedulerConfig {
            recompute_interval_secs: 3600,
            max_snapshot_age_secs: max_age,
            recompute_wait_ms: 5_000,
        };
        ForecastService::new(forecaster, config)
    }

    #[tokio::test]
    async fn test_first_prediction_fits_model() {
        let service = service(120);
        assert_eq!(service.status().state(), FitState::Unfit);

        let result = service.predict(&PredictionRequest::at(0.0, 0.0)).await;
        assert!(result.reason.is_none());
        assert_eq!(service.status().state(), FitState::Fit);
        assert_eq!(service.status().version, 1);
    }

    #[tokio::test]
    async fn test_fresh_snapshot_is_reused() {
        let service = service(120);
        service.ensure_fresh().await;
        service.ensure_fresh().await;
        let _ = service.predict(&PredictionRequest::at(0.0, 0.0)).await;
        assert_eq!(service.status().version, 1);
    }

    #[tokio::test]
    async fn test_periodic_task_publishes() {
        let service = service(120);
        let (shutdown, _) = broadcast::channel(1);
        let handles = service.start(&shutdown).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.send(()).unwrap();
        for h in handles {
            h.await.unwrap();
        }
        assert!(service.status().version >= 1);
    }

    struct SlowCatalog {
        inner: MemoryCatalog,
        loads: AtomicUsize,
        delay: Duration,
    }

    impl CatalogSource for SlowCatalog {
        fn events(&self) -> Vec<Event> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.inner.events()
        }
    }

    #[tokio::test]
    async fn test_timed_out_callers_share_one_recompute() {
        let source = Arc::new(SlowCatalog {
            inner: MemoryCatalog::with_events(SyntheticCatalog::new(0.0, 0.0).count(100).seed(4).generate()),
            loads: AtomicUsize::new(0),
            delay: Duration::from_millis(600),
        });
        let model = ModelConfig { bootstrap_samples: 20, ..ModelConfig::default() };
        let forecaster = Arc::new(Forecaster::new(source.clone(), model));
        let service = ForecastService::new(
            forecaster,
            SchedulerConfig {
                recompute_interval_secs: 3600,
                max_snapshot_age_secs: 120,
                recompute_wait_ms: 50,
            },
        );

        for _ in 0..4 {
            service.ensure_fresh().await;
        }
        assert_eq!(service.status().version, 0);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(service.status().version, 1);
        service.ensure_fresh().await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }
}
