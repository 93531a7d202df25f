// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Catalog store - persistent, id-deduplicated event storage

use anyhow::Result;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSource, Event};
use crate::config::DatabaseConfig;
use crate::feeds::FeedEvent;

/// SQLite-backed event catalog
pub struct CatalogStore {
    conn: Mutex<Connection>,
    refresh: Option<Arc<Notify>>,
}

impl CatalogStore {
    /// Open or create the store
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self::from_connection(conn)?;
        info!("Catalog store opened at {:?}", config.path);
        Ok(store)
    }

    /// Throwaway store, used by tests and demo runs
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                time_ms INTEGER NOT NULL,
                magnitude REAL NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                depth_km REAL,
                place TEXT NOT NULL DEFAULT '',
                source TEXT NOT NULL DEFAULT '',
                ingested_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_time ON events(time_ms);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            refresh: None,
        })
    }

    /// Wake this handle when the core asks for fresher data
    pub fn with_refresh_signal(mut self, notify: Arc<Notify>) -> Self {
        self.refresh = Some(notify);
        self
    }

    /// Insert or replace events by id; the latest ingest wins
    ///
    /// Events that fail validation or sit below `min_magnitude` are skipped.
    /// Returns the number of rows written.
    pub fn upsert_events(&self, events: &[FeedEvent], min_magnitude: f64) -> Result<usize> {
        let now_ms = Utc::now().timestamp_millis();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                r#"
                INSERT INTO events (id, time_ms, magnitude, latitude, longitude, depth_km, place, source, ingested_at_ms)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    time_ms = excluded.time_ms,
                    magnitude = excluded.magnitude,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude,
                    depth_km = excluded.depth_km,
                    place = excluded.place,
                    source = excluded.source,
                    ingested_at_ms = excluded.ingested_at_ms
                "#,
            )?;

            for raw in events {
                let Some(event) = raw.to_event() else {
                    debug!("Skipping invalid feed event {}", raw.id);
                    continue;
                };
                if event.magnitude < min_magnitude {
                    continue;
                }
                written += stmt.execute(params![
                    event.id,
                    event.time.timestamp_millis(),
                    event.magnitude,
                    event.latitude,
                    event.longitude,
                    event.depth_km,
                    raw.place,
                    raw.source,
                    now_ms,
                ])?;
            }
        }
        tx.commit()?;

        if written > 0 {
            debug!("Stored {} events", written);
        }
        Ok(written)
    }

    /// All events, time ascending
    pub fn load_catalog(&self) -> Result<Vec<Event>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, time_ms, magnitude, latitude, longitude, depth_km FROM events ORDER BY time_ms, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, Option<f64>>(5)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, time_ms, magnitude, latitude, longitude, depth_km) = row?;
            let Some(time) = Utc.timestamp_millis_opt(time_ms).single() else {
                continue;
            };
            if let Some(event) = Event::new(id, time, magnitude, latitude, longitude, depth_km) {
                events.push(event);
            }
        }
        Ok(events)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl CatalogSource for CatalogStore {
    fn events(&self) -> Vec<Event> {
        self.load_catalog().unwrap_or_else(|e| {
            warn!("Catalog load failed, treating as empty: {}", e);
            Vec::new()
        })
    }

    fn request_refresh(&self) {
        if let Some(notify) = &self.refresh {
            notify.notify_one();
        }
    }
}
