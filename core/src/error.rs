//! Error taxonomy for the compliance engine.
//!
//! - `LoadError`:       structural/type problems in raw input. Fatal to a load.
//! - `ValidationError`: aggregated integrity diagnostics. Never thrown by the
//!                      checker itself; produced on request from a report.
//! - `QueryError`:      aggregate queries over an empty filtered subset.
//! - Network/Authorization: reserved for the surrounding application so that
//!                      failures outside the engine classify the same way.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed {record}: field '{field}' {reason}")]
    Malformed {
        record: String,
        field:  String,
        reason: String,
    },

    #[error("Invalid JSON in {source_name}: {error}")]
    Json {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },

    #[error("Cannot read {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
}

impl LoadError {
    pub fn malformed(
        record: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        LoadError::Malformed {
            record: record.into(),
            field:  field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} integrity violation(s): {}", errors.len(), errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("No comparisons recorded for metric '{metric}'")]
    EmptyMetricSet { metric: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {error}")]
    Read {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Authorization error: {message}")]
    Authorization { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse classification shared with the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Validation,
    Authorization,
    Server,
    Client,
    Unknown,
}

impl ErrorKind {
    /// Classify a free-form failure message from outside the engine.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("network") || lower.contains("fetch") || lower.contains("connection") {
            ErrorKind::Network
        } else if lower.contains("unauthorized") || lower.contains("forbidden") {
            ErrorKind::Authorization
        } else if lower.contains("validation") || lower.contains("invalid") {
            ErrorKind::Validation
        } else if lower.trim().is_empty() {
            ErrorKind::Unknown
        } else {
            ErrorKind::Client
        }
    }

    /// Only network-class failures are worth retrying by a caller.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Network | ErrorKind::Server)
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Load(LoadError::Io { .. }) => ErrorKind::Server,
            EngineError::Load(_)                   => ErrorKind::Validation,
            EngineError::Validation(_)             => ErrorKind::Validation,
            EngineError::Query(_)                  => ErrorKind::Client,
            EngineError::Config(_)                 => ErrorKind::Client,
            EngineError::Network { .. }            => ErrorKind::Network,
            EngineError::Authorization { .. }      => ErrorKind::Authorization,
            EngineError::Other(e)                  => ErrorKind::classify_message(&e.to_string()),
        }
    }
}
