// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Synthetic Gutenberg-Richter catalogs for demo mode and testing

use std::f64::consts::LN_10;

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Exp1;

use crate::analysis::statistics::round_to;
use crate::catalog::{geo, Event};
use crate::analysis::DAYS_PER_YEAR;

/// Draw `n` magnitudes from a Gutenberg-Richter law with slope `b` above `mc`
///
/// With a positive `bin_width` the continuous draws start half a bin below
/// `mc` and are rounded to the bin grid, the way catalogs report magnitudes.
pub fn gutenberg_richter_magnitudes<R: Rng + ?Sized>(
    n: usize,
    b: f64,
    mc: f64,
    bin_width: f64,
    rng: &mut R,
) -> Vec<f64> {
    if !(b > 0.0) {
        return Vec::new();
    }
    let beta = b * LN_10;
    let floor = if bin_width > 0.0 { mc - bin_width / 2.0 } else { mc };

    (0..n)
        .map(|_| {
            let m = floor + rng.sample::<f64, _>(Exp1) / beta;
            if bin_width > 0.0 {
                round_to((m / bin_width).round() * bin_width, 6).max(mc)
            } else {
                m
            }
        })
        .collect()
}

/// Builder for a uniformly scattered, Poissonian synthetic catalog
#[derive(Debug, Clone)]
pub struct SyntheticCatalog {
    latitude: f64,
    longitude: f64,
    box_km: f64,
    count: usize,
    span_years: f64,
    b_value: f64,
    mc: f64,
    bin_width: f64,
    end_time: Option<DateTime<Utc>>,
    seed: u64,
}

impl SyntheticCatalog {
    /// Catalog centred on a point, 1000 events over 5 years, b = 1 above M3
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            box_km: 1000.0,
            count: 1000,
            span_years: 5.0,
            b_value: 1.0,
            mc: 3.0,
            bin_width: 0.1,
            end_time: None,
            seed: 0,
        }
    }

    /// Side of the square box, km
    pub fn box_km(mut self, side: f64) -> Self {
        self.box_km = side.max(0.0);
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn span_years(mut self, years: f64) -> Self {
        self.span_years = years.max(0.0);
        self
    }

    pub fn b_value(mut self, b: f64) -> Self {
        self.b_value = b;
        self
    }

    pub fn mc(mut self, mc: f64) -> Self {
        self.mc = mc;
        self
    }

    pub fn bin_width(mut self, width: f64) -> Self {
        self.bin_width = width;
        self
    }

    /// Time of the end of the span; defaults to now
    pub fn end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate time-sorted events
    pub fn generate(&self) -> Vec<Event> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let end = self.end_time.unwrap_or_else(Utc::now);
        let span_ms = (self.span_years * DAYS_PER_YEAR * 86_400_000.0) as i64;
        let start = end - Duration::milliseconds(span_ms);

        let magnitudes = gutenberg_richter_magnitudes(self.count, self.b_value, self.mc, self.bin_width, &mut rng);
        let mut events: Vec<Event> = magnitudes
            .into_iter()
            .enumerate()
            .filter_map(|(i, magnitude)| {
                let offset = if span_ms > 0 { rng.gen_range(0..=span_ms) } else { 0 };
                let north = (rng.gen::<f64>() - 0.5) * self.box_km;
                let east = (rng.gen::<f64>() - 0.5) * self.box_km;
                let (lat, lon) = geo::offset_km(self.latitude, self.longitude, north, east);
                let depth = rng.gen_range(2.0..35.0);
                Event::new(
                    format!("syn{}-{:05}", self.seed, i),
                    start + Duration::milliseconds(offset),
                    magnitude,
                    lat,
                    lon,
                    Some(depth),
                )
            })
            .collect();

        events.sort_by_key(|e| e.time);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_magnitudes_on_grid_above_mc() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mags = gutenberg_richter_magnitudes(1000, 1.0, 3.0, 0.1, &mut rng);
        assert_eq!(mags.len(), 1000);
        for m in mags {
            assert!(m >= 3.0);
            assert!(((m * 10.0).round() - m * 10.0).abs() < 1e-6, "{m} off grid");
        }
    }

    #[test]
    fn test_invalid_b_yields_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(gutenberg_richter_magnitudes(10, 0.0, 3.0, 0.1, &mut rng).is_empty());
    }

    #[test]
    fn test_catalog_shape() {
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let events = SyntheticCatalog::new(30.0, 80.0)
            .count(250)
            .box_km(200.0)
            .span_years(2.0)
            .end_time(end)
            .seed(4)
            .generate();

        assert_eq!(events.len(), 250);
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
        assert!(events.iter().all(|e| e.time <= end && e.time >= end - Duration::days(731)));
        assert!(events.iter().all(|e| e.distance_km(30.0, 80.0) <= 200.0 / 2.0 * 2f64.sqrt() + 1.0));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let a = SyntheticCatalog::new(0.0, 0.0).count(50).end_time(end).seed(9).generate();
        let b = SyntheticCatalog::new(0.0, 0.0).count(50).end_time(end).seed(9).generate();
        assert_eq!(a, b);
    }
}
