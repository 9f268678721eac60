//! The compliance engine: config, polarity table and snapshot in one place.
//!
//! FLOW (fixed):
//!   1. Load the three documents into a `Snapshot` (any bad record aborts)
//!   2. Gate it through the integrity checker (violations are data)
//!   3. Serve queries against the current snapshot on demand
//!
//! RULES:
//!   - No query mutates the snapshot.
//!   - Queries that need the snapshot borrow it from an `Arc` the caller
//!     holds (`engine.snapshot()`), so a concurrent reload never changes
//!     what an in-flight query sees.

use crate::{
    config::{DataPaths, EngineConfig},
    error::EngineResult,
    integrity::IntegrityReport,
    model::{CategoryMetric, PredictionData, TrendPoint},
    snapshot::{Snapshot, SnapshotHandle},
    stats::{self, ComplianceStatus},
    trend::{self, MetricSummary, PolarityTable, PredictionOverview, PredictionTrend, TrendSummary},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ComplianceEngine {
    config:     EngineConfig,
    polarities: PolarityTable,
    paths:      Option<DataPaths>,
    snapshot:   SnapshotHandle,
}

impl ComplianceEngine {
    pub fn new(config: EngineConfig, snapshot: Snapshot) -> Self {
        Self {
            polarities: config.polarity_table(),
            config,
            paths: None,
            snapshot: SnapshotHandle::new(snapshot),
        }
    }

    /// Load config and documents from a data directory.
    pub fn open(data_dir: &Path) -> EngineResult<Self> {
        let config = EngineConfig::load_or_default(data_dir)?;
        let paths = DataPaths::in_dir(data_dir);
        let snapshot = Snapshot::load(&paths)?;
        let mut engine = Self::new(config, snapshot);
        engine.paths = Some(paths);
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn polarities(&self) -> &PolarityTable {
        &self.polarities
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        self.paths
            .as_ref()
            .and_then(|p| p.metrics.parent().map(Path::to_path_buf))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.current()
    }

    /// Re-read the documents this engine was opened from.
    /// On failure the previous snapshot stays in effect.
    pub fn reload(&self) -> EngineResult<Arc<Snapshot>> {
        match &self.paths {
            Some(paths) => Ok(self.snapshot.reload(|| Snapshot::load(paths))?),
            None => Err(anyhow::anyhow!("engine was not opened from a data directory").into()),
        }
    }

    pub fn replace_snapshot(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.snapshot.replace(snapshot)
    }

    pub fn integrity(&self) -> IntegrityReport {
        self.snapshot().check_integrity()
    }

    // ── Config-bound queries ─────────────────────────────────────────

    pub fn trend_direction(&self, series: &[TrendPoint]) -> TrendSummary {
        trend::trend_direction_with(series, self.config.trend_noise_floor_pct)
    }

    pub fn prediction_trend(&self, prediction: &PredictionData) -> PredictionTrend {
        trend::prediction_trend(
            prediction.current_value,
            prediction.predicted_value,
            &prediction.metric,
            &self.polarities,
        )
    }

    pub fn prediction_overview(&self, predictions: &[PredictionData]) -> PredictionOverview {
        trend::prediction_overview(predictions, &self.polarities)
    }

    pub fn metric_summary<'a>(&self, snapshot: &'a Snapshot, metric: &'a str) -> Option<MetricSummary<'a>> {
        trend::metric_summary_with(&snapshot.analytics, metric, self.config.summary_stable_threshold_pct)
    }

    pub fn critical_categories<'a>(&self, breakdown: &'a [CategoryMetric]) -> Vec<&'a CategoryMetric> {
        stats::critical_categories_below(breakdown, self.config.critical_rate_threshold)
    }

    pub fn top_performers<'a>(&self, breakdown: &'a [CategoryMetric]) -> Vec<&'a CategoryMetric> {
        stats::top_performers(breakdown, self.config.top_performers_limit)
    }

    pub fn compliance_status(&self, rate: f64) -> ComplianceStatus {
        stats::compliance_status_with(
            rate,
            self.config.good_rate_threshold,
            self.config.critical_rate_threshold,
        )
    }
}
