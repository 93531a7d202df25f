// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Catalog module - events, catalogs and the source trait the core reads from

mod memory;
pub mod geo;

pub use memory::MemoryCatalog;

use std::collections::HashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single validated earthquake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub time: DateTime<Utc>,
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: Option<f64>,
}

impl Event {
    /// Build an event, rejecting non-finite magnitude or coordinates
    pub fn new(
        id: impl Into<String>,
        time: DateTime<Utc>,
        magnitude: f64,
        latitude: f64,
        longitude: f64,
        depth_km: Option<f64>,
    ) -> Option<Self> {
        if !(magnitude.is_finite() && latitude.is_finite() && longitude.is_finite()) {
            return None;
        }
        if latitude.abs() > 90.0 || longitude.abs() > 360.0 {
            return None;
        }
        Some(Self {
            id: id.into(),
            time,
            magnitude,
            latitude,
            longitude,
            depth_km: depth_km.filter(|d| d.is_finite()),
        })
    }

    /// Great-circle distance to a point, in km
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        geo::haversine_km(self.latitude, self.longitude, latitude, longitude)
    }
}

/// Time-ascending, id-unique event sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    events: Vec<Event>,
}

impl Catalog {
    /// Sort by time and resolve duplicate ids to the last ingested version
    pub fn from_events(events: Vec<Event>) -> Self {
        let mut last_seen: HashMap<&str, usize> = HashMap::with_capacity(events.len());
        for (idx, event) in events.iter().enumerate() {
            last_seen.insert(event.id.as_str(), idx);
        }
        let keep: Vec<bool> = events
            .iter()
            .enumerate()
            .map(|(idx, e)| last_seen.get(e.id.as_str()) == Some(&idx))
            .collect();

        let mut events: Vec<Event> = events
            .into_iter()
            .zip(keep)
            .filter_map(|(e, k)| k.then_some(e))
            .collect();
        events.sort_by_key(|e| e.time);

        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the most recent event
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|e| e.time)
    }
}

/// Supplier of the live catalog
///
/// Implementations must never fail outward: fetch or storage problems degrade
/// to an empty or stale catalog and are logged where they happen.
pub trait CatalogSource: Send + Sync {
    /// Current deduplicated, validated, time-ascending events
    fn events(&self) -> Vec<Event>;

    /// Ask the collaborator to refresh its data; returns immediately
    fn request_refresh(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, day: u32, mag: f64) -> Event {
        Event::new(id, Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(), mag, 10.0, 20.0, None).unwrap()
    }

    #[test]
    fn test_rejects_non_finite() {
        let t = Utc::now();
        assert!(Event::new("x", t, f64::NAN, 0.0, 0.0, None).is_none());
        assert!(Event::new("x", t, 3.0, f64::INFINITY, 0.0, None).is_none());
        assert!(Event::new("x", t, 3.0, 0.0, 0.0, Some(f64::NAN)).unwrap().depth_km.is_none());
    }

    #[test]
    fn test_catalog_sorted_and_deduplicated() {
        let catalog = Catalog::from_events(vec![
            event("b", 5, 3.0),
            event("a", 2, 3.1),
            event("b", 7, 3.4),
            event("c", 1, 4.0),
        ]);

        let ids: Vec<&str> = catalog.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(catalog.events()[2].magnitude, 3.4);
        assert_eq!(catalog.latest_time(), Some(Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap()));
    }
}
