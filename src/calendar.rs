//! Calendar grid construction
//!
//! Lays the days of a year (or month) out as a seven-row matrix, one row per
//! weekday starting with Monday, one column per week. Cells before the first
//! and after the last day are padding so the matrix stays rectangular.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::EngineError;
use crate::normalizer::Normalizer;
use crate::types::{GridCell, HistorySeries, MetricDefinition};

/// Color of a day without an entry
pub const NO_ENTRY_COLOR: &str = "#D9DCCF";

/// Color of padding cells outside the displayed range
pub const BACKGROUND_COLOR: &str = "#383838";

/// Rows of the grid, one per weekday
pub const WEEKDAY_ROWS: usize = 7;

/// Gregorian leap year rule
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn year_length(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Weekday bucket 1-7, Monday = 1
pub fn weekday_bucket(date: NaiveDate) -> usize {
    date.weekday().number_from_monday() as usize
}

/// Assign buckets 1-7 cyclically to `day_count` days, the first day getting
/// `first_bucket`
pub fn day_buckets(first_bucket: usize, day_count: usize) -> Vec<usize> {
    (0..day_count)
        .map(|i| (first_bucket - 1 + i) % WEEKDAY_ROWS + 1)
        .collect()
}

/// Weekday-aligned color matrix for one metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarGrid {
    first_day: NaiveDate,
    day_count: usize,
    rows: Vec<Vec<GridCell>>,
}

impl CalendarGrid {
    /// Grid for the whole year containing `reference`
    pub fn year(
        reference: NaiveDate,
        series: &HistorySeries,
        definition: &MetricDefinition,
    ) -> Result<Self, EngineError> {
        let year = reference.year();
        let first_day = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| EngineError::Config(format!("year {year} out of range")))?;
        Self::build(first_day, year_length(year) as usize, series, definition)
    }

    /// Grid for the month containing `reference`
    pub fn month(
        reference: NaiveDate,
        series: &HistorySeries,
        definition: &MetricDefinition,
    ) -> Result<Self, EngineError> {
        let first_day = reference.with_day(1).unwrap_or(reference);
        let next_month = first_day
            .checked_add_months(chrono::Months::new(1))
            .ok_or_else(|| EngineError::Config(format!("month of {reference} out of range")))?;
        let day_count = (next_month - first_day).num_days() as usize;
        Self::build(first_day, day_count, series, definition)
    }

    /// Grid over `day_count` days starting at `first_day`.
    ///
    /// Entries are walked in stored order. A day with an entry takes the
    /// gradient color of that entry's position in the series, so entries
    /// outside the range still shape the gradient.
    pub fn build(
        first_day: NaiveDate,
        day_count: usize,
        series: &HistorySeries,
        definition: &MetricDefinition,
    ) -> Result<Self, EngineError> {
        let colors = Normalizer::colors(series, definition)?;

        let mut entry_colors: HashMap<usize, &str> = HashMap::new();
        for (entry, color) in series.entries.iter().zip(&colors) {
            let offset = (entry.date() - first_day).num_days();
            if offset >= 0 && (offset as usize) < day_count {
                entry_colors.insert(offset as usize, color);
            }
        }

        let buckets = day_buckets(weekday_bucket(first_day), day_count);
        let front = buckets.first().map_or(0, |b| b - 1);
        let back = buckets.last().map_or(0, |b| WEEKDAY_ROWS - b);

        let padding = || GridCell {
            has_entry: false,
            padding: true,
            color: BACKGROUND_COLOR.to_string(),
        };

        let mut cells = Vec::with_capacity(front + day_count + back);
        cells.extend((0..front).map(|_| padding()));
        cells.extend((0..day_count).map(|offset| match entry_colors.get(&offset) {
            Some(color) => GridCell {
                has_entry: true,
                padding: false,
                color: color.to_string(),
            },
            None => GridCell {
                has_entry: false,
                padding: false,
                color: NO_ENTRY_COLOR.to_string(),
            },
        }));
        cells.extend((0..back).map(|_| padding()));

        let mut rows: Vec<Vec<GridCell>> = vec![Vec::new(); WEEKDAY_ROWS];
        for (index, cell) in cells.into_iter().enumerate() {
            rows[index % WEEKDAY_ROWS].push(cell);
        }

        Ok(Self {
            first_day,
            day_count,
            rows,
        })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Last day of the covered range
    pub fn last_day(&self) -> NaiveDate {
        self.first_day
            .checked_add_days(Days::new(self.day_count.saturating_sub(1) as u64))
            .unwrap_or(self.first_day)
    }

    /// Rows by weekday, Monday first
    pub fn rows(&self) -> &[Vec<GridCell>] {
        &self.rows
    }

    /// Number of week columns
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Day cells, padding excluded
    pub fn day_count(&self) -> usize {
        self.cells().filter(|c| !c.padding).count()
    }

    /// Cells holding an entry
    pub fn entry_count(&self) -> usize {
        self.cells().filter(|c| c.has_entry).count()
    }

    /// Cell for a calendar day inside the grid's range
    pub fn cell_for(&self, date: NaiveDate) -> Option<&GridCell> {
        let offset = (date - self.first_day).num_days();
        if offset < 0 || offset as usize >= self.day_count {
            return None;
        }
        let index = weekday_bucket(self.first_day) - 1 + offset as usize;
        self.rows[index % WEEKDAY_ROWS].get(index / WEEKDAY_ROWS)
    }

    /// Plain color token matrix for the rendering layer
    pub fn colors(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.color.clone()).collect())
            .collect()
    }

    fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entry, RuleKind};
    use chrono::{FixedOffset, TimeZone};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_definition() -> MetricDefinition {
        MetricDefinition {
            name: "Mood".to_string(),
            rule: RuleKind::Int10,
            color1: "#000000".to_string(),
            color2: "#ffffff".to_string(),
            ordinal: 0,
        }
    }

    fn make_series(entries: &[(NaiveDate, &str)]) -> HistorySeries {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        HistorySeries {
            name: "Mood".to_string(),
            entries: entries
                .iter()
                .map(|(d, v)| {
                    let ts = offset
                        .from_local_datetime(&d.and_hms_opt(23, 30, 0).unwrap())
                        .unwrap();
                    Entry::new(ts, *v)
                })
                .collect(),
            color1: "#000000".to_string(),
            color2: "#ffffff".to_string(),
        }
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(year_length(2024), 366);
        assert_eq!(year_length(2100), 365);
    }

    #[test]
    fn test_day_buckets_cycle() {
        assert_eq!(day_buckets(6, 4), vec![6, 7, 1, 2]);
        assert_eq!(day_buckets(1, 8), vec![1, 2, 3, 4, 5, 6, 7, 1]);
    }

    #[test]
    fn test_year_day_counts() {
        let series = make_series(&[]);
        let definition = make_definition();

        let grid = CalendarGrid::year(date(2023, 6, 1), &series, &definition).unwrap();
        assert_eq!(grid.day_count(), 365);
        assert_eq!(grid.rows().len(), 7);
        assert!(grid.rows().iter().all(|r| r.len() == grid.width()));

        let grid = CalendarGrid::year(date(2024, 6, 1), &series, &definition).unwrap();
        assert_eq!(grid.day_count(), 366);
        assert_eq!(grid.width(), 53);
    }

    #[test]
    fn test_first_day_lands_on_its_weekday() {
        let series = make_series(&[]);
        let definition = make_definition();

        // 2023-01-01 is a Sunday: six padding cells on top of the first column
        let grid = CalendarGrid::year(date(2023, 3, 3), &series, &definition).unwrap();
        let first_column: Vec<bool> = grid.rows().iter().map(|r| r[0].padding).collect();
        assert_eq!(first_column, vec![true, true, true, true, true, true, false]);
        assert_eq!(grid.width(), 53);
        assert_eq!(grid.rows()[0][0].color, BACKGROUND_COLOR);
        assert_eq!(grid.rows()[6][0].color, NO_ENTRY_COLOR);

        // 2024-01-01 is a Monday: no front padding
        let grid = CalendarGrid::year(date(2024, 3, 3), &series, &definition).unwrap();
        assert!(!grid.rows()[0][0].padding);
    }

    #[test]
    fn test_entries_marked_with_positional_colors() {
        let series = make_series(&[
            (date(2023, 12, 31), "1"),
            (date(2024, 1, 1), "10"),
            (date(2024, 1, 2), "1"),
        ]);
        let definition = make_definition();
        let grid = CalendarGrid::year(date(2024, 1, 15), &series, &definition).unwrap();

        assert_eq!(grid.entry_count(), 2);
        let jan1 = grid.cell_for(date(2024, 1, 1)).unwrap();
        assert!(jan1.has_entry);
        assert_eq!(jan1.color, "#ffffff");
        let jan2 = grid.cell_for(date(2024, 1, 2)).unwrap();
        assert_eq!(jan2.color, "#000000");
        let jan3 = grid.cell_for(date(2024, 1, 3)).unwrap();
        assert!(!jan3.has_entry);
        assert_eq!(jan3.color, NO_ENTRY_COLOR);
        assert!(grid.cell_for(date(2023, 12, 31)).is_none());
    }

    #[test]
    fn test_entry_uses_local_date() {
        // 23:30 at UTC-5 is already the next day in UTC
        let series = make_series(&[(date(2024, 7, 4), "5")]);
        let grid = CalendarGrid::year(date(2024, 1, 1), &series, &make_definition()).unwrap();
        assert!(grid.cell_for(date(2024, 7, 4)).unwrap().has_entry);
        assert!(!grid.cell_for(date(2024, 7, 5)).unwrap().has_entry);
    }

    #[test]
    fn test_month_grid() {
        let series = make_series(&[(date(2024, 2, 29), "3")]);
        let grid = CalendarGrid::month(date(2024, 2, 10), &series, &make_definition()).unwrap();
        assert_eq!(grid.day_count(), 29);
        assert_eq!(grid.entry_count(), 1);
        assert_eq!(grid.first_day(), date(2024, 2, 1));
        assert_eq!(grid.last_day(), date(2024, 2, 29));
        // Feb 1 2024 is a Thursday
        assert!(grid.rows()[2][0].padding);
        assert!(!grid.rows()[3][0].padding);
    }

    #[test]
    fn test_color_matrix_shape() {
        let grid = CalendarGrid::year(date(2025, 1, 1), &make_series(&[]), &make_definition())
            .unwrap();
        let colors = grid.colors();
        assert_eq!(colors.len(), 7);
        assert!(colors.iter().all(|row| row.len() == grid.width()));
    }
}
