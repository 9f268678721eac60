//! Shared primitive types used across the entire engine.

use chrono::{DateTime, Utc};

/// A stable, unique identifier for any record in a snapshot.
pub type EntityId = String;

/// The canonical instant every date-like field is normalised to on load.
pub type Timestamp = DateTime<Utc>;

/// Key of a named metric series (`overall_compliance`, `response_time`, ...).
pub type MetricName = String;

/// Tolerance used when comparing derived floating point values.
pub const FLOAT_TOLERANCE: f64 = 1e-6;
