//! Tunable thresholds for the analytics stages.
//!
//! Every field defaults to the production constants, so an empty TOML file
//! (or no file at all) reproduces the stock scoring exactly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating an [`AnalyticsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub discipline: DisciplineConfig,
    pub health: HealthConfig,
}

impl AnalyticsConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.discipline;
        let thresholds = [d.late_threshold_minutes, d.very_late_threshold_minutes];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ConfigError::Invalid(
                "timing thresholds must be finite and non-negative".into(),
            ));
        }
        if d.late_threshold_minutes > d.very_late_threshold_minutes {
            return Err(ConfigError::Invalid(format!(
                "late_threshold_minutes ({}) exceeds very_late_threshold_minutes ({})",
                d.late_threshold_minutes, d.very_late_threshold_minutes
            )));
        }
        if d.max_total() > 100 {
            return Err(ConfigError::Invalid(format!(
                "discipline ceilings sum to {}, at most 100 allowed",
                d.max_total()
            )));
        }
        if !d.default_contract_size.is_finite() || !d.default_account_size.is_finite() {
            return Err(ConfigError::Invalid(
                "default contract and account sizes must be finite".into(),
            ));
        }
        if !self.health.discipline_floor.is_finite() {
            return Err(ConfigError::Invalid("health.discipline_floor must be finite".into()));
        }
        if self.health.loss_window == 0 {
            return Err(ConfigError::Invalid("health.loss_window must be at least 1".into()));
        }
        Ok(())
    }
}

/// Ceilings and penalties of the discipline score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisciplineConfig {
    pub adherence_ceiling: u32,
    pub timing_ceiling: u32,
    pub risk_ceiling: u32,

    pub strike_penalty: u32,
    pub expiration_penalty: u32,
    pub contracts_penalty: u32,

    /// Entry later (or earlier) than this many minutes costs `late_penalty`.
    pub late_threshold_minutes: f64,
    pub late_penalty: u32,
    /// Beyond this, `very_late_penalty` is charged on top of `late_penalty`.
    pub very_late_threshold_minutes: f64,
    pub very_late_penalty: u32,

    pub dollar_risk_penalty: u32,
    pub percent_risk_penalty: u32,

    /// Shares per contract when the plan does not say.
    pub default_contract_size: f64,
    /// Account size when the plan does not say.
    pub default_account_size: f64,
}

impl Default for DisciplineConfig {
    fn default() -> Self {
        Self {
            adherence_ceiling: 40,
            timing_ceiling: 30,
            risk_ceiling: 30,
            strike_penalty: 15,
            expiration_penalty: 10,
            contracts_penalty: 15,
            late_threshold_minutes: 30.0,
            late_penalty: 10,
            very_late_threshold_minutes: 60.0,
            very_late_penalty: 20,
            dollar_risk_penalty: 15,
            percent_risk_penalty: 15,
            default_contract_size: 100.0,
            default_account_size: 10_000.0,
        }
    }
}

impl DisciplineConfig {
    pub fn max_total(&self) -> u32 {
        self.adherence_ceiling
            .saturating_add(self.timing_ceiling)
            .saturating_add(self.risk_ceiling)
    }
}

/// Weakness-flag thresholds of the health snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Latest discipline score below this raises `discipline_slipping`.
    pub discipline_floor: f64,
    /// This many trailing losing cycles raise `recent_losses`.
    pub loss_window: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            discipline_floor: 60.0,
            loss_window: 3,
        }
    }
}
