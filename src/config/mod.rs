// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/quakecast-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::{DeclusterWindows, EtasParams};
use crate::feeds::FeedConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Log filter directive, e.g. `info` or `quakecast=debug,warn`
    pub log_level: String,

    /// Enable demo mode (synthetic catalog instead of live feeds)
    pub demo_mode: bool,

    /// Statistical model configuration
    pub model: ModelConfig,

    /// Recompute scheduling configuration
    pub scheduler: SchedulerConfig,

    /// Live feed configuration
    pub feeds: FeedConfig,

    /// Catalog store configuration
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "quakecast".to_string(),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            demo_mode: false,
            model: ModelConfig::default(),
            scheduler: SchedulerConfig::default(),
            feeds: FeedConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Filter directive for the log subscriber; `--trace` and `--debug` win over the file
    pub fn log_directive(&self, debug: bool, trace: bool) -> &str {
        if trace {
            "trace"
        } else if debug {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("quakecast"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Statistical model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Histogram bin width for the completeness estimate
    pub mc_bin_width: f64,

    /// Magnitude bin width used in the b-value correction (dM)
    pub magnitude_bin_width: f64,

    /// Bootstrap resamples for the b-value interval
    pub bootstrap_samples: usize,

    /// Bootstrap seed
    pub bootstrap_seed: u64,

    /// Years of catalog, back from the latest event, used for the fit
    pub fit_window_years: f64,

    /// Days of catalog, back from the latest event, searched for triggers
    pub trigger_window_days: f64,

    /// Minimum trigger magnitude
    pub trigger_min_magnitude: f64,

    /// Short-term multiplier parameters
    pub etas: EtasParams,

    /// Declustering windows
    pub decluster: DeclusterWindows,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            mc_bin_width: 0.1,
            magnitude_bin_width: 0.1,
            bootstrap_samples: 500,
            bootstrap_seed: 0,
            fit_window_years: 5.0,
            trigger_window_days: 30.0,
            trigger_min_magnitude: 4.0,
            etas: EtasParams::default(),
            decluster: DeclusterWindows::default(),
        }
    }
}

/// Recompute scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Period of the background recompute task, seconds
    pub recompute_interval_secs: u64,

    /// Snapshot age above which a prediction asks for a recompute, seconds
    pub max_snapshot_age_secs: u64,

    /// Longest a prediction waits for that recompute, milliseconds
    pub recompute_wait_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            recompute_interval_secs: 60,
            max_snapshot_age_secs: 120,
            recompute_wait_ms: 2000,
        }
    }
}

/// Catalog store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/catalog.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_roundtrip_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.model.bootstrap_samples, 500);
        assert_eq!(parsed.model.etas, EtasParams::default());
        assert_eq!(parsed.scheduler.recompute_interval_secs, 60);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            demo_mode = true

            [model]
            fit_window_years = 10.0

            [model.etas]
            K = 0.1
            alpha = 0.8
            p = 1.1
            c = 0.02
            Mref = 4.5
            "#,
        )
        .unwrap();
        assert!(parsed.demo_mode);
        assert_eq!(parsed.model.fit_window_years, 10.0);
        assert_eq!(parsed.model.etas.k, 0.1);
        assert_eq!(parsed.model.mc_bin_width, 0.1);
        assert_eq!(parsed.database.path, PathBuf::from("./data/catalog.db"));
    }

    #[test]
    fn test_log_directive_precedence() {
        let config: Config = toml::from_str(r#"log_level = "quakecast=debug,warn""#).unwrap();
        assert_eq!(config.log_directive(false, false), "quakecast=debug,warn");
        assert_eq!(config.log_directive(true, false), "debug");
        assert_eq!(config.log_directive(true, true), "trace");
        assert_eq!(Config::default().log_directive(false, false), "info");
    }
}
