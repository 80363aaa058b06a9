//! Core types for habitgrid
//!
//! This module defines the data structures shared by every stage: metric
//! definitions, the per-metric history series, the aggregate entry store and
//! the derived values handed to the rendering layer.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// Rule kind governing the raw values of a metric
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    /// One or more decimal digits
    Int,
    /// Single digit scale, see [`crate::rules::Int10Rule`]
    Int10,
    /// Clock time `HH:MM`
    Time,
    /// Any other token. `bool` and `goal` land here: they were sketched as
    /// rule kinds once but never wired up.
    Unsupported(String),
}

impl RuleKind {
    pub fn parse(token: &str) -> Self {
        match token {
            "int" => RuleKind::Int,
            "int10" => RuleKind::Int10,
            "time" => RuleKind::Time,
            other => RuleKind::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RuleKind::Int => "int",
            RuleKind::Int10 => "int10",
            RuleKind::Time => "time",
            RuleKind::Unsupported(token) => token,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, RuleKind::Unsupported(_))
    }
}

impl From<String> for RuleKind {
    fn from(token: String) -> Self {
        RuleKind::parse(&token)
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display and validation policy for one tracked habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub name: String,
    pub rule: RuleKind,
    /// Heatmap color for the lowest value (hex)
    pub color1: String,
    /// Heatmap color for the highest value (hex)
    pub color2: String,
    /// Position in the current configuration
    pub ordinal: usize,
}

/// One recorded value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Moment of recording, in the recorder's local offset
    pub timestamp: DateTime<FixedOffset>,
    /// Raw value as typed by the user
    pub value: String,
}

impl Entry {
    pub fn new(timestamp: DateTime<FixedOffset>, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    /// Calendar day the entry belongs to
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Ordered history of one metric. At most one entry per calendar day,
/// ascending by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub name: String,
    pub entries: Vec<Entry>,
    pub color1: String,
    pub color2: String,
}

impl HistorySeries {
    /// Fresh series for a newly introduced metric
    pub fn empty_for(definition: &MetricDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            entries: Vec::new(),
            color1: definition.color1.clone(),
            color2: definition.color2.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.value.as_str())
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.iter().map(Entry::date)
    }

    /// Record a value for the day of `timestamp`: overwrites the last entry
    /// if it falls on the same day, appends otherwise.
    pub fn record(&mut self, timestamp: DateTime<FixedOffset>, value: &str) {
        match self.entries.last_mut() {
            Some(last) if last.date() == timestamp.date_naive() => {
                last.timestamp = timestamp;
                last.value = value.to_string();
            }
            _ => self.entries.push(Entry::new(timestamp, value)),
        }
    }
}

/// Aggregate root: metric definitions paired index-for-index with their
/// history series
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStore {
    pub definitions: Vec<MetricDefinition>,
    pub series: Vec<HistorySeries>,
}

impl EntryStore {
    pub fn metric_names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name.clone()).collect()
    }

    pub fn series_names(&self) -> Vec<String> {
        self.series.iter().map(|s| s.name.clone()).collect()
    }

    /// Definitions and series line up one-to-one by name
    pub fn is_consistent(&self) -> bool {
        self.definitions.len() == self.series.len()
            && self
                .definitions
                .iter()
                .zip(&self.series)
                .all(|(d, s)| d.name == s.name)
    }

    /// Definition and series for a metric position
    pub fn metric(&self, index: usize) -> Result<(&MetricDefinition, &HistorySeries), EngineError> {
        match (self.definitions.get(index), self.series.get(index)) {
            (Some(definition), Some(series)) => Ok((definition, series)),
            _ => Err(EngineError::UnknownMetric(index)),
        }
    }
}

/// One day position of the calendar matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    /// A recorded entry falls on this day
    pub has_entry: bool,
    /// Cell lies outside the displayed date range
    pub padding: bool,
    /// Hex color token
    pub color: String,
}

/// Summary line shown under a metric's heatmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub min: String,
    pub max: String,
    pub avg: String,
    pub current_streak: usize,
    pub longest_streak: usize,
}

/// Result of submitting one batch of values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Accepted,
    Rejected { first_invalid_index: usize },
}

impl SubmitOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

/// What reconciliation did to the stored series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Configured names differed from stored names
    pub changed: bool,
    /// Metrics that start with an empty history
    pub added: Vec<String>,
    /// Stored series without a configured metric, history discarded
    pub dropped: Vec<String>,
    /// Number of entries lost with the dropped series
    pub dropped_entries: usize,
    /// Surviving metrics changed their relative order
    pub reordered: bool,
}
