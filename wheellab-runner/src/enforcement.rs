//! Small-account guardrails applied when a position is opened.
//!
//! Rules run in a fixed order and the first violation wins:
//! minimum trade size, maximum allocation, maximum open positions.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use wheellab_core::domain::{PositionRequest, SmallAccountSettings};

/// Why a position was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    BelowMinTradeSize,
    ExceedsMaxAllocation,
    MaxOpenPositionsReached,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BelowMinTradeSize => "below_min_trade_size",
            Self::ExceedsMaxAllocation => "exceeds_max_allocation",
            Self::MaxOpenPositionsReached => "max_open_positions_reached",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum EnforcementDecision {
    /// Missing plan id, entry price, or contract count.
    Unenforceable,
    /// Owner has no small-account settings, or they are disabled.
    Skipped,
    Accepted,
    Rejected(RejectionReason),
}

/// Check `position` against the owner's settings.
///
/// `open_positions` is the number of the owner's positions already open;
/// counting them is the caller's job.
pub fn enforce_position(
    position: &PositionRequest,
    settings: Option<&SmallAccountSettings>,
    open_positions: usize,
) -> EnforcementDecision {
    let has_price = position.entry_price.is_some_and(|p| p != 0.0);
    let has_contracts = position.contracts.is_some_and(|c| c > 0.0);
    if position.plan_id.is_none() || !has_price || !has_contracts {
        return EnforcementDecision::Unenforceable;
    }

    let Some(sa) = settings.filter(|s| s.enabled) else {
        return EnforcementDecision::Skipped;
    };

    let decision = match check_rules(position.entry_cost(), sa, open_positions) {
        Some(reason) => EnforcementDecision::Rejected(reason),
        None => EnforcementDecision::Accepted,
    };
    debug!(plan = ?position.plan_id, ?decision, "position checked");
    decision
}

fn check_rules(
    entry_cost: f64,
    sa: &SmallAccountSettings,
    open_positions: usize,
) -> Option<RejectionReason> {
    if sa.min_trade_size.is_some_and(|min| entry_cost < min) {
        return Some(RejectionReason::BelowMinTradeSize);
    }
    if let (Some(capital), Some(pct)) = (sa.starting_capital, sa.max_allocation_pct) {
        if entry_cost > capital * pct {
            return Some(RejectionReason::ExceedsMaxAllocation);
        }
    }
    if sa
        .max_open_positions
        .is_some_and(|max| open_positions as f64 >= max)
    {
        return Some(RejectionReason::MaxOpenPositionsReached);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(price: f64, contracts: f64) -> PositionRequest {
        PositionRequest {
            plan_id: Some("plan-1".into()),
            entry_price: Some(price),
            contracts: Some(contracts),
        }
    }

    fn settings() -> SmallAccountSettings {
        SmallAccountSettings {
            enabled: true,
            min_trade_size: Some(50.0),
            starting_capital: Some(2000.0),
            max_allocation_pct: Some(0.25),
            max_open_positions: Some(3.0),
        }
    }

    #[test]
    fn incomplete_position_is_unenforceable() {
        let mut p = position(2.0, 1.0);
        p.plan_id = None;
        assert_eq!(enforce_position(&p, Some(&settings()), 0), EnforcementDecision::Unenforceable);
        assert_eq!(
            enforce_position(&position(0.0, 1.0), Some(&settings()), 0),
            EnforcementDecision::Unenforceable
        );
        assert_eq!(
            enforce_position(&position(2.0, 0.0), Some(&settings()), 0),
            EnforcementDecision::Unenforceable
        );
    }

    #[test]
    fn disabled_or_missing_settings_skip() {
        let mut sa = settings();
        sa.enabled = false;
        assert_eq!(
            enforce_position(&position(100.0, 1.0), Some(&sa), 0),
            EnforcementDecision::Skipped
        );
        assert_eq!(
            enforce_position(&position(100.0, 1.0), None, 0),
            EnforcementDecision::Skipped
        );
    }

    #[test]
    fn rules_in_order() {
        let sa = settings();
        assert_eq!(
            enforce_position(&position(10.0, 2.0), Some(&sa), 5),
            EnforcementDecision::Rejected(RejectionReason::BelowMinTradeSize)
        );
        assert_eq!(
            enforce_position(&position(300.0, 2.0), Some(&sa), 5),
            EnforcementDecision::Rejected(RejectionReason::ExceedsMaxAllocation)
        );
        assert_eq!(
            enforce_position(&position(100.0, 2.0), Some(&sa), 3),
            EnforcementDecision::Rejected(RejectionReason::MaxOpenPositionsReached)
        );
        assert_eq!(
            enforce_position(&position(100.0, 2.0), Some(&sa), 2),
            EnforcementDecision::Accepted
        );
    }

    #[test]
    fn allocation_at_limit_is_allowed() {
        // 250 × 2 = 500 = 2000 × 0.25
        assert_eq!(
            enforce_position(&position(250.0, 2.0), Some(&settings()), 0),
            EnforcementDecision::Accepted
        );
    }

    #[test]
    fn decision_serializes_with_reason_tag() {
        let d = EnforcementDecision::Rejected(RejectionReason::ExceedsMaxAllocation);
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"decision":"rejected","reason":"exceeds_max_allocation"}"#
        );
        assert_eq!(
            serde_json::to_string(&EnforcementDecision::Accepted).unwrap(),
            r#"{"decision":"accepted"}"#
        );
    }
}
