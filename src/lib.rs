//! habitgrid - data engine for a personal habit tracker
//!
//! Each tracked metric (a habit with a typed value) keeps a daily history.
//! The engine validates new values, keeps stored history in step with an
//! edited metric configuration, and derives what a front end displays:
//! calendar heatmaps, min/avg/max and streaks.
//!
//! ## Modules
//!
//! - **Rules**: validate, decode and encode raw values per rule kind
//! - **Reconcile**: migrate stored series to the configured metrics
//! - **Calendar**: weekday-aligned year and month grids
//! - **Normalizer / Aggregate**: gradient colors, summary figures, streaks

pub mod aggregate;
pub mod calendar;
pub mod color;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod reconcile;
pub mod rules;
pub mod store;
pub mod types;

pub use calendar::CalendarGrid;
pub use config::Config;
pub use error::EngineError;
pub use pipeline::{reconcile_store_json, HabitTracker};
pub use reconcile::Reconciler;
pub use rules::ValueRule;
pub use types::{
    Entry, EntryStore, GridCell, HistorySeries, MetricDefinition, ReconcileReport, RuleKind,
    SubmitOutcome, Summary,
};

/// habitgrid version
pub const HABITGRID_VERSION: &str = env!("CARGO_PKG_VERSION");
