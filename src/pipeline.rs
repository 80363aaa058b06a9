//! Tracker orchestration
//!
//! This module provides the public API used by a front end. It loads the
//! configuration and the store, reconciles them, and answers view and entry
//! requests against the in-memory store.

use chrono::{DateTime, FixedOffset, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::aggregate::summarize;
use crate::calendar::CalendarGrid;
use crate::config::Config;
use crate::error::EngineError;
use crate::reconcile::Reconciler;
use crate::store;
use crate::types::{EntryStore, MetricDefinition, ReconcileReport, SubmitOutcome, Summary};

/// Reconcile a stored JSON document against a TOML configuration.
///
/// # Arguments
/// * `config_toml` - Configuration file contents
/// * `store_json` - Store file contents
///
/// # Returns
/// The reconciled store document
///
/// # Example
/// ```ignore
/// let migrated = reconcile_store_json(&config_toml, &store_json)?;
/// ```
pub fn reconcile_store_json(config_toml: &str, store_json: &str) -> Result<String, EngineError> {
    let config = Config::from_toml_str(config_toml)?;
    let stored = EntryStore::from_json(store_json)?;
    HabitTracker::new(&config, stored)?.to_json()
}

/// Stateful tracker holding the reconciled store for a session.
///
/// When opened from files, every accepted submission is written back to the
/// store file.
pub struct HabitTracker {
    store: EntryStore,
    report: ReconcileReport,
    store_path: Option<PathBuf>,
}

impl HabitTracker {
    /// Reconcile `stored` against the configuration
    pub fn new(config: &Config, mut stored: EntryStore) -> Result<Self, EngineError> {
        let definitions = config.metric_definitions()?;
        let report = Reconciler::apply(&mut stored, definitions);
        Ok(Self {
            store: stored,
            report,
            store_path: None,
        })
    }

    /// Load configuration and store from disk, reconcile, and write the
    /// reconciled store back
    pub fn open(config_path: &Path, store_path: &Path) -> Result<Self, EngineError> {
        let config = Config::load(config_path)?;
        let stored = store::load(store_path)?;
        let mut tracker = Self::new(&config, stored)?;
        tracker.store_path = Some(store_path.to_path_buf());
        tracker.save()?;
        info!(
            metrics = tracker.store.definitions.len(),
            changed = tracker.report.changed,
            "opened tracker"
        );
        Ok(tracker)
    }

    /// What startup reconciliation changed
    pub fn reconcile_report(&self) -> &ReconcileReport {
        &self.report
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.store.definitions
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.store.metric_names()
    }

    /// Year heatmap for a metric
    pub fn render_grid(
        &self,
        metric_index: usize,
        reference_date: NaiveDate,
    ) -> Result<CalendarGrid, EngineError> {
        let (definition, series) = self.store.metric(metric_index)?;
        CalendarGrid::year(reference_date, series, definition)
    }

    /// Month heatmap for a metric
    pub fn render_month(
        &self,
        metric_index: usize,
        reference_date: NaiveDate,
    ) -> Result<CalendarGrid, EngineError> {
        let (definition, series) = self.store.metric(metric_index)?;
        CalendarGrid::month(reference_date, series, definition)
    }

    /// Min/avg/max and streaks, `None` while the metric has no entries
    pub fn summary(&self, metric_index: usize) -> Result<Option<Summary>, EngineError> {
        let (definition, series) = self.store.metric(metric_index)?;
        summarize(series, definition)
    }

    /// Record one value per metric for the day of `now`.
    ///
    /// Every value is validated first; if any fails, nothing is recorded and
    /// the index of the first failing metric is returned. An existing entry
    /// for the same day is overwritten. After an accepted submission the store
    /// is persisted if the tracker was opened from files; a failed write is
    /// returned as an error while the in-memory store keeps the new values.
    pub fn submit_entry<S: AsRef<str>>(
        &mut self,
        values: &[S],
        now: DateTime<FixedOffset>,
    ) -> Result<SubmitOutcome, EngineError> {
        let expected = self.store.definitions.len();
        if values.len() != expected {
            return Err(EngineError::ValueCountMismatch {
                expected,
                actual: values.len(),
            });
        }

        let invalid = self
            .store
            .definitions
            .iter()
            .zip(values)
            .position(|(definition, raw)| !definition.rule.validate(raw.as_ref()));
        if let Some(first_invalid_index) = invalid {
            debug!(index = first_invalid_index, "rejected entry batch");
            return Ok(SubmitOutcome::Rejected {
                first_invalid_index,
            });
        }

        for (series, raw) in self.store.series.iter_mut().zip(values) {
            series.record(now, raw.as_ref());
        }
        debug!(date = %now.date_naive(), "recorded entry batch");

        if self.store_path.is_some() {
            self.save()?;
        }
        Ok(SubmitOutcome::Accepted)
    }

    /// Write the store to the file it was opened from, if any
    pub fn save(&self) -> Result<(), EngineError> {
        match &self.store_path {
            Some(path) => store::save(path, &self.store),
            None => Ok(()),
        }
    }

    /// Serialize the store document
    pub fn to_json(&self) -> Result<String, EngineError> {
        self.store.to_json()
    }
}
