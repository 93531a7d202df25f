// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Live catalog feeds - NCS and USGS pollers feeding the catalog store

pub mod ncs;
pub mod usgs;

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Notify};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::catalog::Event;
use crate::db::CatalogStore;

/// Feed polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// NCS last-day feed
    pub ncs_url: String,

    /// NCS last-week feed, tried when the last-day feed fails
    pub ncs_fallback_url: String,

    /// USGS GeoJSON summary feeds
    pub usgs_feeds: Vec<String>,

    pub poll_interval_secs: u64,

    /// Events below this magnitude are not stored
    pub min_magnitude_for_storage: f64,

    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ncs_url: "https://seismo.gov.in/sites/default/files/eqjson.json".to_string(),
            ncs_fallback_url: "https://seismo.gov.in/sites/default/files/eqjson7days.json".to_string(),
            usgs_feeds: vec![
                "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson".to_string(),
            ],
            poll_interval_secs: 300,
            min_magnitude_for_storage: 2.5,
            request_timeout_secs: 15,
        }
    }
}

/// Raw record as read from a feed, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub id: String,
    pub time: Option<DateTime<Utc>>,
    pub magnitude: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub depth_km: Option<f64>,
    pub place: String,
    pub source: String,
}

impl FeedEvent {
    /// Validated event, or `None` when a required field is missing or bad
    pub fn to_event(&self) -> Option<Event> {
        if self.id.is_empty() {
            return None;
        }
        Event::new(
            self.id.clone(),
            self.time?,
            self.magnitude?,
            self.latitude?,
            self.longitude?,
            self.depth_km,
        )
    }
}

/// Numeric field that some feeds ship as a string
fn number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `[lon, lat, depth]` GeoJSON point
fn point(feature: &serde_json::Value) -> (Option<f64>, Option<f64>, Option<f64>) {
    let coords = &feature["geometry"]["coordinates"];
    (number(&coords[0]), number(&coords[1]), number(&coords[2]))
}

/// Anything that yields a batch of raw events
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<FeedEvent>>;
}

async fn get_json(client: &Client, url: &str) -> Result<serde_json::Value> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?
        .error_for_status()?;
    Ok(response.json().await?)
}

/// NCS feed with a last-week fallback
pub struct NcsFeed {
    client: Client,
    primary: String,
    fallback: String,
}

#[async_trait]
impl FeedSource for NcsFeed {
    fn name(&self) -> &str {
        "NCS"
    }

    async fn fetch(&self) -> Result<Vec<FeedEvent>> {
        let body = match get_json(&self.client, &self.primary).await {
            Ok(body) => body,
            Err(e) => {
                debug!("NCS day feed failed ({}), trying week feed", e);
                get_json(&self.client, &self.fallback).await?
            }
        };
        Ok(ncs::parse_json(&body))
    }
}

/// One USGS GeoJSON summary feed
pub struct UsgsFeed {
    client: Client,
    url: String,
}

#[async_trait]
impl FeedSource for UsgsFeed {
    fn name(&self) -> &str {
        "USGS"
    }

    async fn fetch(&self) -> Result<Vec<FeedEvent>> {
        let body = get_json(&self.client, &self.url).await?;
        Ok(usgs::parse_geojson(&body))
    }
}

/// Polls every configured feed into the catalog store
pub struct FeedPoller {
    sources: Vec<Box<dyn FeedSource>>,
    store: Arc<CatalogStore>,
    wake: Arc<Notify>,
    poll_interval: Duration,
    min_magnitude: f64,
}

impl FeedPoller {
    /// HTTP poller over the configured NCS and USGS feeds
    pub fn new(config: &FeedConfig, store: Arc<CatalogStore>, wake: Arc<Notify>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("quakecast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut sources: Vec<Box<dyn FeedSource>> = vec![Box::new(NcsFeed {
            client: client.clone(),
            primary: config.ncs_url.clone(),
            fallback: config.ncs_fallback_url.clone(),
        })];
        for url in &config.usgs_feeds {
            sources.push(Box::new(UsgsFeed {
                client: client.clone(),
                url: url.clone(),
            }));
        }

        Ok(Self::with_sources(sources, store, wake, config))
    }

    pub fn with_sources(
        sources: Vec<Box<dyn FeedSource>>,
        store: Arc<CatalogStore>,
        wake: Arc<Notify>,
        config: &FeedConfig,
    ) -> Self {
        Self {
            sources,
            store,
            wake,
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            min_magnitude: config.min_magnitude_for_storage,
        }
    }

    /// Fetch every source once; a failing source is logged and skipped
    pub async fn poll_once(&self) -> usize {
        let mut stored = 0;
        for source in &self.sources {
            let events = match source.fetch().await {
                Ok(events) => events,
                Err(e) => {
                    warn!("{} feed unavailable: {:#}", source.name(), e);
                    continue;
                }
            };
            match self.store.upsert_events(&events, self.min_magnitude) {
                Ok(n) => stored += n,
                Err(e) => warn!("Storing {} events failed: {}", source.name(), e),
            }
        }
        if stored > 0 {
            info!("Persisted {} feed events", stored);
        }
        stored
    }

    /// Poll on the interval, or early when woken, until shutdown
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Feed poller running every {:?} over {} sources", self.poll_interval, self.sources.len());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = self.wake.notified() => {
                    debug!("Refresh requested, polling early");
                    self.poll_once().await;
                }
                _ = shutdown.recv() => {
                    info!("Feed poller stopped");
                    break;
                }
            }
        }
    }
}
