use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, io, path::Path};

use crate::domain::analysis::AnalysisSettings;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeCfg {
    pub tick_interval_ms: u64,
    pub cleanup_interval_ms: u64,
    pub log_level: String,
}

impl Default for RuntimeCfg {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            cleanup_interval_ms: 60_000,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportCfg {
    /// Path of the JSON-lines feed, `-` for stdin
    pub input: String,
    pub publish_buffer: usize,
}

impl Default for TransportCfg {
    fn default() -> Self {
        Self {
            input: "-".to_string(),
            publish_buffer: 1_024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
    pub runtime: RuntimeCfg,
    pub transport: TransportCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).context("parse Config.toml")?;
        Ok(cfg)
    }

    /// `None` when the file does not exist; any other failure is an error
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        match fs::metadata(path.as_ref()) {
            Ok(_) => Self::from_file(path).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("stat {}", path.as_ref().display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::ThresholdDirection;

    #[test]
    fn test_full_config() {
        let cfg = Config::from_toml(
            r#"
            [analysis]
            oi_threshold = 4.5
            price_threshold = 12
            limit_signals_per_day = 3
            time_window_ms = 600000
            threshold_direction = "increase-only"

            [runtime]
            tick_interval_ms = 500

            [transport]
            input = "feed.jsonl"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.analysis.oi_threshold, 4.5);
        assert_eq!(cfg.analysis.price_threshold, 12.0);
        assert_eq!(cfg.analysis.limit_signals_per_day, 3);
        assert_eq!(cfg.analysis.time_window_ms, 600_000);
        assert_eq!(cfg.analysis.cooldown_period_ms, 20 * 60 * 1000);
        assert_eq!(cfg.analysis.threshold_direction, ThresholdDirection::IncreaseOnly);
        assert_eq!(cfg.runtime.tick_interval_ms, 500);
        assert_eq!(cfg.runtime.cleanup_interval_ms, 60_000);
        assert_eq!(cfg.transport.input, "feed.jsonl");
        assert_eq!(cfg.transport.publish_buffer, 1_024);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.analysis.price_threshold, 10.0);
        assert_eq!(cfg.runtime.log_level, "info");
        assert_eq!(cfg.transport.input, "-");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("[analysis\noi_threshold = ").is_err());
        assert!(Config::from_toml("[analysis]\noi_threshold = \"high\"").is_err());
    }

    #[test]
    fn test_missing_file_is_none() {
        let loaded = Config::load_optional("/nonexistent/market-pulse/Config.toml").unwrap();
        assert!(loaded.is_none());
    }
}
