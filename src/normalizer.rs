//! Value normalization
//!
//! This module maps a metric's decoded values onto 0-1 and from there onto
//! the metric's two-color gradient.
//! - Position 0 is the series minimum, 1 the maximum
//! - A flat series maps every value to the upper end of the gradient

use crate::color::{color_for, Rgb};
use crate::error::EngineError;
use crate::rules::decode_all;
use crate::types::{HistorySeries, MetricDefinition, RuleKind};

/// Position used for every value when the series has no spread
pub const FLAT_SERIES_POSITION: f64 = 1.0;

/// Normalizer for converting raw series values to gradient positions and colors
pub struct Normalizer;

impl Normalizer {
    /// Normalize every value of the series to 0-1, in stored order
    pub fn normalize(series: &HistorySeries, rule: &RuleKind) -> Result<Vec<f64>, EngineError> {
        let decoded = decode_all(rule, &series.name, series.values())?;
        Ok(normalize_values(&decoded))
    }

    /// Gradient color for every entry of the series, in stored order
    pub fn colors(
        series: &HistorySeries,
        definition: &MetricDefinition,
    ) -> Result<Vec<String>, EngineError> {
        let positions = Self::normalize(series, &definition.rule)?;
        if positions.is_empty() {
            return Ok(Vec::new());
        }

        let low = Rgb::from_hex(&definition.color1)?;
        let high = Rgb::from_hex(&definition.color2)?;
        Ok(positions
            .into_iter()
            .map(|t| low.blend_luv(high, t).to_hex())
            .collect())
    }

    /// Single color at a gradient position
    pub fn color_at(t: f64, definition: &MetricDefinition) -> Result<String, EngineError> {
        color_for(t, &definition.color1, &definition.color2)
    }
}

/// Map integers onto 0-1 by min-max scaling
pub fn normalize_values(values: &[i64]) -> Vec<f64> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };

    if max == min {
        return vec![FLAT_SERIES_POSITION; values.len()];
    }

    let min = i128::from(min);
    let range = (i128::from(max) - min) as f64;
    values
        .iter()
        .map(|&v| (i128::from(v) - min) as f64 / range)
        .collect()
}
