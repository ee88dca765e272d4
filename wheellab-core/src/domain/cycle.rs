//! Completed wheel cycles and their market regime label.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::ids::{CycleId, StrategyId};
use crate::instant::DateLike;
use crate::lenient;

/// Bucket used for cycles that carry no regime label.
pub const UNKNOWN_REGIME: &str = "unknown";

/// Coarse market-condition label.
///
/// Labels outside the three known regimes are kept verbatim so they still
/// group on their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Regime {
    Uptrend,
    Downtrend,
    Sideways,
    Other(String),
}

impl Regime {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Uptrend => "uptrend",
            Self::Downtrend => "downtrend",
            Self::Sideways => "sideways",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Regime {
    fn from(label: String) -> Self {
        match label.as_str() {
            "uptrend" => Self::Uptrend,
            "downtrend" => Self::Downtrend,
            "sideways" => Self::Sideways,
            _ => Self::Other(label),
        }
    }
}

impl From<&str> for Regime {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<Regime> for String {
    fn from(regime: Regime) -> Self {
        regime.as_str().to_string()
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One closed round-trip of a wheel strategy. Immutable once closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    #[serde(default)]
    pub id: CycleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<StrategyId>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub realized_pnl: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub unrealized_pnl: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub discipline_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_regime",
        skip_serializing_if = "Option::is_none"
    )]
    pub dominant_regime: Option<Regime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateLike>,
}

impl Cycle {
    pub fn realized(&self) -> f64 {
        self.realized_pnl.unwrap_or(0.0)
    }

    /// Realized plus unrealized P&L, missing parts counted as zero.
    pub fn combined_pnl(&self) -> f64 {
        self.realized() + self.unrealized_pnl.unwrap_or(0.0)
    }

    pub fn discipline(&self) -> f64 {
        self.discipline_score.unwrap_or(0.0)
    }

    /// Grouping key: the regime label, or `"unknown"`.
    pub fn regime_key(&self) -> &str {
        self.dominant_regime
            .as_ref()
            .map_or(UNKNOWN_REGIME, Regime::as_str)
    }

    pub fn is_winner(&self) -> bool {
        self.realized() > 0.0
    }
}

fn lenient_regime<'de, D>(deserializer: D) -> Result<Option<Regime>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::text(deserializer)?.map(Regime::from))
}
