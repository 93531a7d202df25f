//! In-process catalog

use parking_lot::RwLock;
use tracing::debug;

use super::{Catalog, CatalogSource, Event};

/// Catalog held in memory, used for demo mode and tests
#[derive(Default)]
pub struct MemoryCatalog {
    catalog: RwLock<Catalog>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            catalog: RwLock::new(Catalog::from_events(events)),
        }
    }

    /// Merge events; a repeated id replaces the stored version
    pub fn ingest(&self, events: Vec<Event>) {
        let mut catalog = self.catalog.write();
        let count = events.len();
        let mut merged = std::mem::take(&mut *catalog).into_events();
        merged.extend(events);
        *catalog = Catalog::from_events(merged);
        debug!("Ingested {} events, catalog now {}", count, catalog.len());
    }

    /// Replace the whole catalog
    pub fn replace(&self, events: Vec<Event>) {
        *self.catalog.write() = Catalog::from_events(events);
    }

    pub fn len(&self) -> usize {
        self.catalog.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.read().is_empty()
    }
}

impl CatalogSource for MemoryCatalog {
    fn events(&self) -> Vec<Event> {
        self.catalog.read().events().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_ingest_replaces_by_id() {
        let t0 = Utc::now();
        let source = MemoryCatalog::new();
        source.ingest(vec![Event::new("us1", t0, 3.2, 1.0, 2.0, None).unwrap()]);
        source.ingest(vec![
            Event::new("us1", t0, 3.6, 1.0, 2.0, Some(10.0)).unwrap(),
            Event::new("us0", t0 - Duration::hours(1), 2.9, 1.0, 2.0, None).unwrap(),
        ]);

        let events = source.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "us0");
        assert_eq!(events[1].magnitude, 3.6);
    }
}
