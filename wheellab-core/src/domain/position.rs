//! Position-open requests and the owner's small-account guardrails.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// A newly created position, as far as guardrails care.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    /// Journal entry (trade plan) the position was opened against.
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub plan_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub entry_price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub contracts: Option<f64>,
}

impl PositionRequest {
    /// Premium paid or received: entry price × contracts.
    pub fn entry_cost(&self) -> f64 {
        self.entry_price.unwrap_or(0.0) * self.contracts.unwrap_or(0.0)
    }
}

/// Per-user limits for small accounts. Enforced only when `enabled` is true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallAccountSettings {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub enabled: bool,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_trade_size: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub starting_capital: Option<f64>,
    /// Fraction of starting capital a single position may use (0.25 = 25%).
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_allocation_pct: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_open_positions: Option<f64>,
}
