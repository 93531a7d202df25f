// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Task scheduler for timed operations
//!
//! Each enabled task runs on its own tokio interval. The closure itself runs
//! on the blocking pool, since fits are CPU bound, and a slow run delays the
//! next tick instead of stacking runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

type TaskFn = Arc<dyn Fn() + Send + Sync + 'static>;

struct ScheduledTask {
    interval: Duration,
    task: TaskFn,
    enabled: bool,
}

/// Named recurring tasks
pub struct Scheduler {
    tasks: Arc<RwLock<HashMap<String, ScheduledTask>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add_task<F>(&self, name: &str, interval: Duration, task: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut tasks = self.tasks.write().await;
        tasks.insert(
            name.to_string(),
            ScheduledTask {
                interval,
                task: Arc::new(task),
                enabled: true,
            },
        );
        debug!("Scheduled task '{}' with interval {:?}", name, interval);
    }

    pub async fn remove_task(&self, name: &str) {
        let mut tasks = self.tasks.write().await;
        tasks.remove(name);
    }

    pub async fn enable_task(&self, name: &str, enabled: bool) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(name) {
            task.enabled = enabled;
        }
    }

    pub async fn task_names(&self) -> Vec<String> {
        self.tasks.read().await.keys().cloned().collect()
    }

    /// Start every enabled task; each stops when `shutdown` fires
    ///
    /// The first run of each task happens immediately.
    pub async fn start(&self, shutdown: &broadcast::Sender<()>) -> Vec<JoinHandle<()>> {
        let tasks = self.tasks.read().await;
        let mut handles = Vec::new();

        for (name, scheduled) in tasks.iter().filter(|(_, t)| t.enabled) {
            let name = name.clone();
            let task = Arc::clone(&scheduled.task);
            let period = scheduled.interval;
            let mut shutdown_rx = shutdown.subscribe();

            handles.push(tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                info!("Task '{}' running every {:?}", name, period);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let task = Arc::clone(&task);
                            if let Err(e) = tokio::task::spawn_blocking(move || task()).await {
                                warn!("Task '{}' failed: {}", name, e);
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("Task '{}' shutting down", name);
                            break;
                        }
                    }
                }
            }));
        }

        handles
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_runs_until_shutdown() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        scheduler
            .add_task("count", Duration::from_millis(10), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        let (shutdown, _) = broadcast::channel(1);
        let handles = scheduler.start(&shutdown).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown.send(()).unwrap();
        for h in handles {
            h.await.unwrap();
        }

        let seen = runs.load(Ordering::SeqCst);
        assert!(seen >= 2, "ran {seen} times");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn test_disabled_task_not_started() {
        let scheduler = Scheduler::new();
        scheduler.add_task("idle", Duration::from_millis(5), || {}).await;
        scheduler.enable_task("idle", false).await;
        let (shutdown, _) = broadcast::channel(1);
        assert!(scheduler.start(&shutdown).await.is_empty());

        scheduler.remove_task("idle").await;
        assert!(scheduler.task_names().await.is_empty());
    }
}
