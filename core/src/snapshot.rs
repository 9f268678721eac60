//! The read-only snapshot and its atomically swappable handle.
//!
//! A snapshot is built once per load and never mutated. A refresh builds a
//! complete new snapshot and swaps the shared reference in one assignment;
//! readers holding the old `Arc` keep a consistent view until they drop it.
//! A failed load leaves the current snapshot in place.

use crate::{
    config::DataPaths,
    error::LoadError,
    integrity::{check_integrity, IntegrityReport},
    loader,
    model::{AnalyticsData, MetricsData, RegulationItem},
    types::Timestamp,
};
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub items:     Vec<RegulationItem>,
    pub metrics:   MetricsData,
    pub analytics: AnalyticsData,
    pub loaded_at: Timestamp,
}

impl Snapshot {
    pub fn new(items: Vec<RegulationItem>, metrics: MetricsData, analytics: AnalyticsData) -> Self {
        Self { items, metrics, analytics, loaded_at: Utc::now() }
    }

    /// Build from the three raw documents. Any malformed record fails all.
    pub fn from_values(items: &Value, metrics: &Value, analytics: &Value) -> Result<Self, LoadError> {
        Ok(Self::new(
            loader::load_regulation_items(items)?,
            loader::load_metrics(metrics)?,
            loader::load_analytics(analytics)?,
        ))
    }

    pub fn load(paths: &DataPaths) -> Result<Self, LoadError> {
        Self::from_values(
            &loader::read_json_file(&paths.regulation_items)?,
            &loader::read_json_file(&paths.metrics)?,
            &loader::read_json_file(&paths.analytics)?,
        )
    }

    pub fn check_integrity(&self) -> IntegrityReport {
        check_integrity(&self.items, &self.metrics, &self.analytics)
    }
}

/// Shared, swappable reference to the current snapshot.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)) }
    }

    /// The snapshot in effect right now.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Swap in `snapshot`, returning the one it replaced.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write();
        let previous = std::mem::replace(&mut *guard, next);
        log::info!(
            "Snapshot replaced: {} -> {} regulation items",
            previous.items.len(),
            guard.items.len()
        );
        previous
    }

    /// Run `load` and swap only on success. The load runs outside the lock.
    pub fn reload<F>(&self, load: F) -> Result<Arc<Snapshot>, LoadError>
    where
        F: FnOnce() -> Result<Snapshot, LoadError>,
    {
        match load() {
            Ok(snapshot) => {
                self.replace(snapshot);
                Ok(self.current())
            }
            Err(e) => {
                log::warn!("Reload failed, keeping current snapshot: {e}");
                Err(e)
            }
        }
    }
}
