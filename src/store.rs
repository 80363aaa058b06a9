//! Persisted store format
//!
//! The store is a single JSON document holding the metric table (ordinal to
//! `[name, rule, color1, color2]`) and one record per metric with parallel
//! `Date` and `Value` arrays. This module converts between that shape and the
//! typed [`EntryStore`] and reads/writes it as a whole.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::types::{Entry, EntryStore, HistorySeries, MetricDefinition, RuleKind};

/// Default store file name
pub const DEFAULT_STORE_FILE: &str = "data.json";

/// Store document as written to disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoredStore {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: BTreeMap<usize, Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<StoredSeries>,
}

/// One metric's history as written to disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoredSeries {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: Vec<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: Vec<String>,
    #[serde(default)]
    pub color1: String,
    #[serde(default)]
    pub color2: String,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl StoredStore {
    /// Convert to the typed store, checking the parallel arrays line up
    pub fn into_entry_store(self) -> Result<EntryStore, EngineError> {
        let definitions = self
            .metrics
            .into_iter()
            .map(|(ordinal, row)| -> Result<MetricDefinition, EngineError> {
                let mut fields = row.into_iter();
                let name = fields.next().ok_or_else(|| {
                    EngineError::StoreCorrupt(format!("metric row {ordinal} is empty"))
                })?;
                let rule = RuleKind::parse(&fields.next().unwrap_or_default());
                Ok(MetricDefinition {
                    name,
                    rule,
                    color1: fields.next().unwrap_or_default(),
                    color2: fields.next().unwrap_or_default(),
                    ordinal,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let series = self
            .data
            .into_iter()
            .map(StoredSeries::into_series)
            .collect::<Result<Vec<_>, EngineError>>()?;

        Ok(EntryStore {
            definitions,
            series,
        })
    }

    pub fn from_entry_store(store: &EntryStore) -> Self {
        let metrics = store
            .definitions
            .iter()
            .enumerate()
            .map(|(ordinal, d)| {
                (
                    ordinal,
                    vec![
                        d.name.clone(),
                        d.rule.to_string(),
                        d.color1.clone(),
                        d.color2.clone(),
                    ],
                )
            })
            .collect();

        let data = store
            .series
            .iter()
            .map(|s| StoredSeries {
                name: s.name.clone(),
                date: s.entries.iter().map(|e| e.timestamp).collect(),
                value: s.entries.iter().map(|e| e.value.clone()).collect(),
                color1: s.color1.clone(),
                color2: s.color2.clone(),
            })
            .collect();

        Self { metrics, data }
    }
}

impl StoredSeries {
    fn into_series(self) -> Result<HistorySeries, EngineError> {
        if self.date.len() != self.value.len() {
            return Err(EngineError::StoreCorrupt(format!(
                "metric {:?} has {} dates but {} values",
                self.name,
                self.date.len(),
                self.value.len()
            )));
        }

        let entries: Vec<Entry> = self
            .date
            .into_iter()
            .zip(self.value)
            .map(|(timestamp, value)| Entry { timestamp, value })
            .collect();

        if entries.windows(2).any(|w| w[0].date() > w[1].date()) {
            warn!(metric = %self.name, "stored entries are not in date order");
        }

        Ok(HistorySeries {
            name: self.name,
            entries,
            color1: self.color1,
            color2: self.color2,
        })
    }
}

impl EntryStore {
    /// Load a store from its JSON document
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let stored: StoredStore = serde_json::from_str(json)?;
        stored.into_entry_store()
    }

    /// Serialize the store to its JSON document
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&StoredStore::from_entry_store(self))?)
    }
}

/// Read the store at `path`; a missing file is an empty store
pub fn load(path: &Path) -> Result<EntryStore, EngineError> {
    match std::fs::read_to_string(path) {
        Ok(json) => EntryStore::from_json(&json),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no store yet, starting empty");
            Ok(EntryStore::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Overwrite the store at `path` with the full contents of `store`.
///
/// The document is written next to the target and renamed over it, so a
/// failed write leaves the previous file in place.
pub fn save(path: &Path, store: &EntryStore) -> Result<(), EngineError> {
    let json = store.to_json()?;
    let staging = staging_path(path);
    std::fs::write(&staging, json)?;
    std::fs::rename(&staging, path)?;
    info!(path = %path.display(), metrics = store.series.len(), "saved store");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LEGACY_STORE: &str = r##"{
        "Metrics": {"0": ["Got up", "time"], "1": ["Mood", "int10", "#F25D94", "#EDFF82"]},
        "Data": [
            {
                "Name": "Got up",
                "Date": ["2023-01-03T00:00:00Z", "2023-01-04T06:12:45.123456789+01:00"],
                "Value": ["06:00", "07:30"],
                "Color1": "",
                "Color2": ""
            },
            {"Name": "Mood", "Date": null, "Value": null, "Color1": "#F25D94", "Color2": "#EDFF82"}
        ]
    }"##;

    #[test]
    fn test_parse_legacy_store() {
        let store = EntryStore::from_json(LEGACY_STORE).unwrap();
        assert_eq!(store.definitions.len(), 2);
        assert_eq!(store.definitions[0].rule, RuleKind::Time);
        assert_eq!(store.definitions[0].color1, "");
        assert_eq!(store.definitions[1].color2, "#EDFF82");
        assert_eq!(store.series[0].len(), 2);
        assert_eq!(
            store.series[0].entries[1].date(),
            chrono::NaiveDate::from_ymd_opt(2023, 1, 4).unwrap()
        );
        assert!(store.series[1].is_empty());
    }

    #[test]
    fn test_json_round_trip_is_stable() {
        let store = EntryStore::from_json(LEGACY_STORE).unwrap();
        let json = store.to_json().unwrap();
        let reloaded = EntryStore::from_json(&json).unwrap();
        assert_eq!(reloaded, store);
        assert_eq!(reloaded.to_json().unwrap(), json);
    }

    #[test]
    fn test_mismatched_arrays_are_corrupt() {
        let json = r#"{"Metrics": {}, "Data": [{"Name": "X", "Date": ["2023-01-03T00:00:00Z"], "Value": []}]}"#;
        let err = EntryStore::from_json(json).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_metric_row_is_corrupt() {
        let json = r#"{"Metrics": {"0": []}, "Data": []}"#;
        assert!(matches!(
            EntryStore::from_json(json),
            Err(EngineError::StoreCorrupt(_))
        ));
    }

    #[test]
    fn test_null_document_fields() {
        let store = EntryStore::from_json(r#"{"Metrics": null, "Data": null}"#).unwrap();
        assert_eq!(store, EntryStore::default());
    }

    #[test]
    fn test_load_missing_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);

        let empty = load(&path).unwrap();
        assert_eq!(empty, EntryStore::default());

        let store = EntryStore::from_json(LEGACY_STORE).unwrap();
        save(&path, &store).unwrap();
        assert_eq!(load(&path).unwrap(), store);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join(DEFAULT_STORE_FILE);
        assert!(matches!(
            save(&path, &EntryStore::default()),
            Err(EngineError::Io(_))
        ));
    }
}
