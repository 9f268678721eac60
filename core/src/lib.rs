//! meter-compliance-core: load, validate and analyse utility-meter
//! regulation compliance data.
//!
//! Data flows one way: raw JSON → `loader` → `Snapshot` → `integrity`
//! gate → read-only queries (`query`, `stats`, `trend`).

pub mod config;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod loader;
pub mod model;
pub mod query;
pub mod snapshot;
pub mod stats;
pub mod trend;
pub mod types;
pub mod validator;
