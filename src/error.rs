//! Error types for habitgrid

use thiserror::Error;

/// Errors that can occur while loading, reconciling or aggregating habit data
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stored value does not decode under its metric's rule. Values only
    /// enter the store after validation, so this means the store is damaged.
    #[error("Malformed value {value:?} for metric {metric:?} (rule {rule})")]
    MalformedValue {
        metric: String,
        rule: String,
        value: String,
    },

    #[error("Corrupt store: {0}")]
    StoreCorrupt(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown metric index: {0}")]
    UnknownMetric(usize),

    #[error("Metric {0:?} has no entries")]
    EmptySeries(String),

    #[error("Expected {expected} values, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },
}

impl EngineError {
    /// Whether the error indicates damaged persisted data rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::MalformedValue { .. } | EngineError::StoreCorrupt(_)
        )
    }
}
