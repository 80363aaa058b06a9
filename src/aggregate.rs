//! Series aggregation
//!
//! This module derives the summary figures shown under a heatmap:
//! - Minimum, average and maximum value in display form
//! - Current and longest streak of consecutive entry days

use chrono::{Days, NaiveDate};

use crate::error::EngineError;
use crate::rules::decode_all;
use crate::types::{HistorySeries, MetricDefinition, RuleKind, Summary};

/// Minimum, maximum and average of a series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinMaxAvg {
    pub min: String,
    pub max: String,
    pub avg: String,
}

/// Compute min, max and average in display form.
///
/// Clock times are averaged per component: hours and minutes are summed
/// separately and floor-divided before being recombined, so `23:30` and
/// `00:30` average to `11:30`.
pub fn min_max_avg(series: &HistorySeries, rule: &RuleKind) -> Result<MinMaxAvg, EngineError> {
    let decoded = decode_all(rule, &series.name, series.values())?;
    let (Some(&min), Some(&max)) = (decoded.iter().min(), decoded.iter().max()) else {
        return Err(EngineError::EmptySeries(series.name.clone()));
    };

    // widened so sums of large accepted values cannot overflow
    let count = decoded.len() as i128;
    let avg = match rule {
        RuleKind::Time => {
            let hours: i128 = decoded.iter().map(|&v| i128::from(v / 100)).sum();
            let minutes: i128 = decoded.iter().map(|&v| i128::from(v % 100)).sum();
            (hours / count) * 100 + minutes / count
        }
        _ => decoded.iter().map(|&v| i128::from(v)).sum::<i128>() / count,
    };
    // an average lies between min and max, so it fits back into i64
    let avg = i64::try_from(avg).unwrap_or(max);

    Ok(MinMaxAvg {
        min: rule.encode(min),
        max: rule.encode(max),
        avg: rule.encode(avg),
    })
}

/// Current and longest streak of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    pub current: usize,
    pub longest: usize,
}

/// Walk the entries in order and track consecutive days.
///
/// The counter starts at 1 for the first entry. Each entry whose successor
/// falls on the next calendar day increments it; any other successor resets
/// it to 0. `current` is the counter after the last entry and `longest` the
/// highest value it reached.
pub fn streak(series: &HistorySeries) -> Streak {
    let dates: Vec<NaiveDate> = series.dates().collect();
    streak_over(&dates)
}

/// Streak walk over plain dates
pub fn streak_over(dates: &[NaiveDate]) -> Streak {
    if dates.is_empty() {
        return Streak {
            current: 0,
            longest: 0,
        };
    }

    let mut counter = 1;
    let mut longest = counter;
    for pair in dates.windows(2) {
        let next_day = pair[0].checked_add_days(Days::new(1));
        if next_day == Some(pair[1]) {
            counter += 1;
        } else {
            counter = 0;
        }
        longest = longest.max(counter);
    }

    Streak {
        current: counter,
        longest,
    }
}

/// Full summary for a metric, or `None` if it has no entries yet
pub fn summarize(
    series: &HistorySeries,
    definition: &MetricDefinition,
) -> Result<Option<Summary>, EngineError> {
    if series.is_empty() {
        return Ok(None);
    }

    let stats = min_max_avg(series, &definition.rule)?;
    let streak = streak(series);
    Ok(Some(Summary {
        min: stats.min,
        max: stats.max,
        avg: stats.avg,
        current_streak: streak.current,
        longest_streak: streak.longest,
    }))
}
