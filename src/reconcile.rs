//! Metric reconciliation
//!
//! When the configured metrics differ from the stored ones, the stored
//! history is migrated to the configured order. Series are matched by name
//! only, so renaming a metric drops its history and starts a new, empty one.

use tracing::{info, warn};

use crate::types::{EntryStore, HistorySeries, MetricDefinition, ReconcileReport};

/// Reconciler for keeping stored series in step with the configuration
pub struct Reconciler;

impl Reconciler {
    /// Positional comparison of stored and configured metric names
    pub fn needs_reconcile(previous: &[String], configured: &[String]) -> bool {
        previous != configured
    }

    /// Produce one series per definition, in definition order.
    ///
    /// A stored series whose name matches a definition is carried over with
    /// its entries untouched; definitions without a stored series get an empty
    /// one; stored series matching no definition are dropped.
    pub fn reconcile(
        stored: Vec<HistorySeries>,
        definitions: &[MetricDefinition],
    ) -> (Vec<HistorySeries>, ReconcileReport) {
        let previous: Vec<String> = stored.iter().map(|s| s.name.clone()).collect();
        let mut pool: Vec<Option<HistorySeries>> = stored.into_iter().map(Some).collect();
        let mut report = ReconcileReport {
            changed: true,
            ..Default::default()
        };

        let mut carried_from = Vec::new();
        let mut series = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let found = pool
                .iter()
                .position(|s| s.as_ref().is_some_and(|s| s.name == definition.name));

            match found.and_then(|idx| pool[idx].take().map(|s| (idx, s))) {
                Some((idx, mut carried)) => {
                    carried.color1 = definition.color1.clone();
                    carried.color2 = definition.color2.clone();
                    carried_from.push(idx);
                    series.push(carried);
                }
                None => {
                    report.added.push(definition.name.clone());
                    series.push(HistorySeries::empty_for(definition));
                }
            }
        }

        for dropped in pool.into_iter().flatten() {
            if !dropped.is_empty() {
                warn!(
                    metric = %dropped.name,
                    entries = dropped.len(),
                    "metric no longer configured, discarding its history"
                );
            }
            report.dropped_entries += dropped.len();
            report.dropped.push(dropped.name);
        }

        report.reordered = carried_from.windows(2).any(|w| w[0] > w[1]);

        info!(
            previous = ?previous,
            added = ?report.added,
            dropped = ?report.dropped,
            reordered = report.reordered,
            "reconciled stored metrics with configuration"
        );

        (series, report)
    }

    /// Bring a store in line with the configured definitions in place.
    ///
    /// Definitions are always replaced by the configured ones and series
    /// colors refreshed from them; the series list is only rebuilt when the
    /// names differ.
    pub fn apply(store: &mut EntryStore, definitions: Vec<MetricDefinition>) -> ReconcileReport {
        let previous = store.series_names();
        let configured: Vec<String> = definitions.iter().map(|d| d.name.clone()).collect();

        let report = if Self::needs_reconcile(&previous, &configured) {
            let stored = std::mem::take(&mut store.series);
            let (series, report) = Self::reconcile(stored, &definitions);
            store.series = series;
            report
        } else {
            for (series, definition) in store.series.iter_mut().zip(&definitions) {
                series.color1 = definition.color1.clone();
                series.color2 = definition.color2.clone();
            }
            ReconcileReport::default()
        };

        store.definitions = definitions;
        report
    }
}
