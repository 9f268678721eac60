use crate::{
    error::ConfigError,
    stats::{CRITICAL_RATE_THRESHOLD, DEFAULT_TOP_PERFORMERS, GOOD_RATE_THRESHOLD},
    trend::{default_polarities, Polarity, PolarityTable, SUMMARY_STABLE_THRESHOLD_PCT, TREND_NOISE_FLOOR_PCT},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Tunables for derived queries. Every field has a default, so a config
/// file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trend_noise_floor_pct:        f64,
    pub critical_rate_threshold:      f64,
    pub good_rate_threshold:          f64,
    pub top_performers_limit:         usize,
    pub summary_stable_threshold_pct: f64,
    pub infer_polarity_from_names:    bool,
    pub metric_polarities:            BTreeMap<String, Polarity>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trend_noise_floor_pct:        TREND_NOISE_FLOOR_PCT,
            critical_rate_threshold:      CRITICAL_RATE_THRESHOLD,
            good_rate_threshold:          GOOD_RATE_THRESHOLD,
            top_performers_limit:         DEFAULT_TOP_PERFORMERS,
            summary_stable_threshold_pct: SUMMARY_STABLE_THRESHOLD_PCT,
            infer_polarity_from_names:    true,
            metric_polarities:            default_polarities().into_iter().collect(),
        }
    }
}

impl EngineConfig {
    pub const FILE_NAME: &'static str = "engine_config.json";

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.display().to_string(),
            error,
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// `engine_config.json` in `data_dir` when present, defaults otherwise.
    pub fn load_or_default(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(Self::FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            log::debug!("No {} in {}, using defaults", Self::FILE_NAME, data_dir.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::Invalid {
            field:  field.to_string(),
            reason: reason.to_string(),
        };
        if !(self.trend_noise_floor_pct >= 0.0) {
            return Err(invalid("trend_noise_floor_pct", "must be >= 0"));
        }
        if !(self.summary_stable_threshold_pct >= 0.0) {
            return Err(invalid("summary_stable_threshold_pct", "must be >= 0"));
        }
        for (field, value) in [
            ("critical_rate_threshold", self.critical_rate_threshold),
            ("good_rate_threshold", self.good_rate_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(field, "must be between 0 and 100"));
            }
        }
        if self.good_rate_threshold < self.critical_rate_threshold {
            return Err(invalid("good_rate_threshold", "must not be below critical_rate_threshold"));
        }
        if self.top_performers_limit == 0 {
            return Err(invalid("top_performers_limit", "must be > 0"));
        }
        Ok(())
    }

    pub fn polarity_table(&self) -> PolarityTable {
        let mut table = PolarityTable::new(self.infer_polarity_from_names);
        table.extend(self.metric_polarities.iter().map(|(k, v)| (k.clone(), *v)));
        table
    }
}

/// Locations of the three engine input documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub regulation_items: PathBuf,
    pub metrics:          PathBuf,
    pub analytics:        PathBuf,
}

impl DataPaths {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            regulation_items: data_dir.join("regulation-items.json"),
            metrics:          data_dir.join("metrics-data.json"),
            analytics:        data_dir.join("analytics-data.json"),
        }
    }
}
