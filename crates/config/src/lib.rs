//! Configuration loading and validation for Helmsman.
//!
//! Loads configuration from a TOML file (default `~/.helmsman/config.toml`,
//! overridable via `HELMSMAN_CONFIG`) with in-code defaults for every field.
//! Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl From<ConfigError> for helmsman_core::Error {
    fn from(err: ConfigError) -> Self {
        helmsman_core::Error::Config {
            message: err.to_string(),
        }
    }
}

/// The root configuration structure.
///
/// Maps directly to `~/.helmsman/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelmsmanConfig {
    /// Pipeline behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Anti-pattern detector tuning
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Preference model (bandit) tuning
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Intents whose overall confidence falls below this are downgraded to
    /// clarification-needed.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Whether the anti-pattern scan stage runs at all.
    #[serde(default = "default_true")]
    pub detection_enabled: bool,

    /// Hard ceiling on a single execution attempt.
    #[serde(default = "default_execution_timeout_ms")]
    pub execution_timeout_ms: u64,
}

fn default_confidence_threshold() -> f64 {
    0.7
}
fn default_execution_timeout_ms() -> u64 {
    30_000
}
fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            detection_enabled: true,
            execution_timeout_ms: default_execution_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Short-input classifications beyond this count trigger the
    /// infinite-clarification finding.
    #[serde(default = "default_max_clarification_attempts")]
    pub max_clarification_attempts: usize,

    /// How many trailing events the stuck-loop check inspects.
    #[serde(default = "default_loop_window")]
    pub loop_window: usize,

    /// Minimum distinct stages the window must span to count as progress.
    #[serde(default = "default_min_distinct_stages")]
    pub min_distinct_stages: usize,
}

fn default_max_clarification_attempts() -> usize {
    3
}
fn default_loop_window() -> usize {
    5
}
fn default_min_distinct_stages() -> usize {
    2
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_clarification_attempts: default_max_clarification_attempts(),
            loop_window: default_loop_window(),
            min_distinct_stages: default_min_distinct_stages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Starting exploration rate (the UCB bonus multiplier).
    #[serde(default = "default_initial_exploration")]
    pub initial_exploration: f64,

    /// Multiplicative decay applied to the exploration rate per selection.
    #[serde(default = "default_exploration_decay")]
    pub exploration_decay: f64,

    /// Exploration never decays below this floor.
    #[serde(default = "default_exploration_floor")]
    pub exploration_floor: f64,

    /// Seed for the initial weight RNG — deterministic by default so tests
    /// and replays are reproducible.
    #[serde(default = "default_weight_seed")]
    pub weight_seed: u64,

    /// How many reward-history entries an exported snapshot retains.
    #[serde(default = "default_history_export_cap")]
    pub history_export_cap: usize,
}

fn default_initial_exploration() -> f64 {
    1.0
}
fn default_exploration_decay() -> f64 {
    0.999
}
fn default_exploration_floor() -> f64 {
    0.1
}
fn default_weight_seed() -> u64 {
    42
}
fn default_history_export_cap() -> usize {
    100
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            initial_exploration: default_initial_exploration(),
            exploration_decay: default_exploration_decay(),
            exploration_floor: default_exploration_floor(),
            weight_seed: default_weight_seed(),
            history_export_cap: default_history_export_cap(),
        }
    }
}

impl HelmsmanConfig {
    /// The default config file path: `~/.helmsman/config.toml`, or the
    /// `HELMSMAN_CONFIG` environment variable when set.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("HELMSMAN_CONFIG") {
            return PathBuf::from(path);
        }
        dirs_home()
            .join(".helmsman")
            .join("config.toml")
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Check every field is within its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.pipeline.confidence_threshold) {
            return Err(ConfigError::Invalid {
                field: "pipeline.confidence_threshold",
                message: format!(
                    "must be within [0, 1], got {}",
                    self.pipeline.confidence_threshold
                ),
            });
        }
        if self.detector.loop_window < 2 {
            return Err(ConfigError::Invalid {
                field: "detector.loop_window",
                message: format!("must be at least 2, got {}", self.detector.loop_window),
            });
        }
        if self.detector.min_distinct_stages < 1 {
            return Err(ConfigError::Invalid {
                field: "detector.min_distinct_stages",
                message: "must be at least 1".into(),
            });
        }
        if !(0.0 < self.policy.exploration_decay && self.policy.exploration_decay <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "policy.exploration_decay",
                message: format!(
                    "must be within (0, 1], got {}",
                    self.policy.exploration_decay
                ),
            });
        }
        if self.policy.exploration_floor < 0.0
            || self.policy.exploration_floor > self.policy.initial_exploration
        {
            return Err(ConfigError::Invalid {
                field: "policy.exploration_floor",
                message: format!(
                    "must be within [0, initial_exploration={}], got {}",
                    self.policy.initial_exploration, self.policy.exploration_floor
                ),
            });
        }
        if self.policy.history_export_cap == 0 {
            return Err(ConfigError::Invalid {
                field: "policy.history_export_cap",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = HelmsmanConfig::default();
        config.validate().unwrap();
        assert!((config.pipeline.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert!(config.pipeline.detection_enabled);
        assert_eq!(config.detector.max_clarification_attempts, 3);
        assert_eq!(config.detector.loop_window, 5);
        assert_eq!(config.policy.weight_seed, 42);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = HelmsmanConfig::load(Path::new("/nonexistent/helmsman.toml")).unwrap();
        assert_eq!(config.policy.history_export_cap, 100);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[pipeline]\nconfidence_threshold = 0.8\n\n[detector]\nmax_clarification_attempts = 5"
        )
        .unwrap();

        let config = HelmsmanConfig::load(file.path()).unwrap();
        assert!((config.pipeline.confidence_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.detector.max_clarification_attempts, 5);
        // untouched sections keep their defaults
        assert_eq!(config.detector.loop_window, 5);
        assert!((config.policy.exploration_decay - 0.999).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nconfidence_threshold = 1.5").unwrap();

        let err = HelmsmanConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn zero_decay_is_rejected() {
        let config = HelmsmanConfig {
            policy: PolicyConfig {
                exploration_decay: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exploration_decay"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[pipeline").unwrap();

        let err = HelmsmanConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
