//! TOML configuration
//!
//! The configuration lists the tracked metrics in display order together with
//! a few interface colors that are passed through untouched.
//!
//! ```toml
//! [General]
//! BorderColor = "#874BFD"
//! ActiveButtonColor = "#F25D94"
//! ButtonColor = "#888B7E"
//!
//! [[Metrics]]
//! Name = "Got up"
//! Color1 = "#643AFF"
//! Color2 = "#14F9D5"
//! Rule = "time"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

use crate::color::Rgb;
use crate::error::EngineError;
use crate::types::{MetricDefinition, RuleKind};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Interface colors, irrelevant to the data engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct General {
    #[serde(alias = "border_color")]
    pub border_color: String,
    #[serde(alias = "active_button_color")]
    pub active_button_color: String,
    #[serde(alias = "button_color")]
    pub button_color: String,
}

/// One `[[Metrics]]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricConfig {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "color1")]
    pub color1: String,
    #[serde(alias = "color2")]
    pub color2: String,
    #[serde(alias = "rule")]
    pub rule: RuleKind,
}

/// Parsed configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    #[serde(default, alias = "general")]
    pub general: General,
    #[serde(default, alias = "metrics")]
    pub metrics: Vec<MetricConfig>,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(toml_str: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Configured metric names, in order
    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    /// Typed metric definitions in configuration order.
    ///
    /// Names must be non-empty and colors valid hex. Rule kinds that are not
    /// supported are kept, but every value typed for them will be rejected.
    pub fn metric_definitions(&self) -> Result<Vec<MetricDefinition>, EngineError> {
        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(self.metrics.len());

        for (ordinal, metric) in self.metrics.iter().enumerate() {
            if metric.name.trim().is_empty() {
                return Err(EngineError::Config(format!(
                    "metric #{} has an empty name",
                    ordinal + 1
                )));
            }
            Rgb::from_hex(&metric.color1)?;
            Rgb::from_hex(&metric.color2)?;

            if !metric.rule.is_supported() {
                warn!(
                    metric = %metric.name,
                    rule = %metric.rule,
                    "rule kind is not supported, values for this metric will be rejected"
                );
            }
            if !seen.insert(metric.name.as_str()) {
                warn!(metric = %metric.name, "metric name configured more than once");
            }

            definitions.push(MetricDefinition {
                name: metric.name.clone(),
                rule: metric.rule.clone(),
                color1: metric.color1.clone(),
                color2: metric.color2.clone(),
                ordinal,
            });
        }

        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r##"
[General]
BorderColor = "#874BFD"
ActiveButtonColor = "#F25D94"
ButtonColor = "#888B7E"

[[Metrics]]
Name = "Got up"
Color1 = "#643AFF"
Color2 = "#14F9D5"
Rule = "time"

[[Metrics]]
Name = "Mood"
Color1 = "#F25D94"
Color2 = "#EDFF82"
Rule = "int10"

[[Metrics]]
Name = "Worked out"
Color1 = "#000000"
Color2 = "#FFFFFF"
Rule = "bool"
"##;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.general.border_color, "#874BFD");
        assert_eq!(config.metric_names(), vec!["Got up", "Mood", "Worked out"]);
        assert_eq!(config.metrics[1].rule, RuleKind::Int10);
        assert_eq!(
            config.metrics[2].rule,
            RuleKind::Unsupported("bool".to_string())
        );
    }

    #[test]
    fn test_metric_definitions() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let definitions = config.metric_definitions().unwrap();
        assert_eq!(definitions.len(), 3);
        assert_eq!(definitions[0].rule, RuleKind::Time);
        assert_eq!(definitions[2].ordinal, 2);
        assert_eq!(definitions[1].color2, "#EDFF82");
    }

    #[test]
    fn test_snake_case_keys() {
        let config = Config::from_toml_str(
            r##"
[[metrics]]
name = "Pages"
color1 = "#000"
color2 = "#fff"
rule = "int"
"##,
        )
        .unwrap();
        assert_eq!(config.metrics[0].rule, RuleKind::Int);
        assert_eq!(config.general, General::default());
    }

    #[test]
    fn test_invalid_color_rejected() {
        let config = Config::from_toml_str(
            r##"
[[Metrics]]
Name = "Pages"
Color1 = "blue"
Color2 = "#fff"
Rule = "int"
"##,
        )
        .unwrap();
        assert!(matches!(
            config.metric_definitions(),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let config = Config::from_toml_str(
            r##"
[[Metrics]]
Name = " "
Color1 = "#000"
Color2 = "#fff"
Rule = "int"
"##,
        )
        .unwrap();
        assert!(config.metric_definitions().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            Config::from_toml_str("[[Metrics]\nName ="),
            Err(EngineError::TomlError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, SAMPLE).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.metrics.len(), 3);

        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
