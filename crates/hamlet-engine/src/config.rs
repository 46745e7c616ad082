//! Configuration for the demo engine.
//!
//! The canonical configuration lives in `hamlet-engine.yaml` at the
//! project root. Every field has a default, so a missing file runs the
//! demo with the stock farmer day.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration, mirroring `hamlet-engine.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Simulated day boundaries.
    #[serde(default)]
    pub day: DayConfig,

    /// Hourly stat drift applied to the farmer.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Goal criticality thresholds for GOAP takeover.
    #[serde(default)]
    pub goals: GoalsConfig,

    /// Plan search limits.
    #[serde(default)]
    pub planner: PlannerSearchConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path. A missing
    /// file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be
    /// read, or [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Simulated day boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayConfig {
    /// First simulated hour of the day.
    #[serde(default = "default_start_hour")]
    pub start_hour: i64,

    /// Last simulated hour of the day (inclusive).
    #[serde(default = "default_end_hour")]
    pub end_hour: i64,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

/// Hourly stat drift.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsConfig {
    /// Hunger gained per simulated hour.
    #[serde(default = "default_hunger_per_hour")]
    pub hunger_per_hour: i64,

    /// Energy change per simulated hour (negative drains).
    #[serde(default = "default_energy_per_hour")]
    pub energy_per_hour: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            hunger_per_hour: default_hunger_per_hour(),
            energy_per_hour: default_energy_per_hour(),
        }
    }
}

/// Goal criticality thresholds.
///
/// The demo goals carry small priorities (3..10), so the thresholds here
/// sit well below the library defaults; `get_food` crosses them only
/// when hunger passes 80.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoalsConfig {
    /// Final-relevance bound a goal must exceed to be critical.
    #[serde(default = "default_critical_relevance")]
    pub critical_relevance: f32,

    /// Priority bound a goal must exceed to be critical.
    #[serde(default = "default_critical_priority")]
    pub critical_priority: u8,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            critical_relevance: default_critical_relevance(),
            critical_priority: default_critical_priority(),
        }
    }
}

/// Plan search limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlannerSearchConfig {
    /// Maximum search iterations before a plan attempt is abandoned.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for PlannerSearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

const fn default_start_hour() -> i64 {
    6
}

const fn default_end_hour() -> i64 {
    22
}

const fn default_hunger_per_hour() -> i64 {
    5
}

const fn default_energy_per_hour() -> i64 {
    -3
}

const fn default_critical_relevance() -> f32 {
    0.07
}

const fn default_critical_priority() -> u8 {
    7
}

const fn default_max_iterations() -> usize {
    1000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = EngineConfig::parse("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.day.start_hour, 6);
        assert_eq!(config.day.end_hour, 22);
        assert_eq!(config.stats.energy_per_hour, -3);
        assert_eq!(config.planner.max_iterations, 1000);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = EngineConfig::parse(
            "day:\n  start_hour: 8\nstats:\n  hunger_per_hour: 10\n",
        )
        .unwrap();
        assert_eq!(config.day.start_hour, 8);
        assert_eq!(config.day.end_hour, 22);
        assert_eq!(config.stats.hunger_per_hour, 10);
        assert_eq!(config.stats.energy_per_hour, -3);
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(EngineConfig::parse("day: [not, a, map]").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::from_file(Path::new("does-not-exist.yaml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
