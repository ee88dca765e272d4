//! Discipline scoring: how closely an executed trade followed its plan.
//!
//! Three sub-scores, each an additive penalty taken from a ceiling and clamped
//! to `[0, ceiling]`:
//! - **adherence** (40): strike, expiration, contract count
//! - **timing** (30): distance between planned entry and fill time
//! - **risk** (30): dollar risk to the planned stop vs. planned limits
//!
//! A field that is missing or unparseable skips its check. Scoring never fails.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use wheellab_core::domain::{ExecutedParams, PlannedParams};
use wheellab_core::instant::minutes_between;
use wheellab_core::DateLike;

use crate::config::DisciplineConfig;

/// Sub-scores and their sum. Recomputed on demand, never updated in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisciplineBreakdown {
    pub adherence: u32,
    pub timing: u32,
    pub risk: u32,
    pub total: u32,
}

impl DisciplineBreakdown {
    fn new(adherence: u32, timing: u32, risk: u32) -> Self {
        Self {
            adherence,
            timing,
            risk,
            total: adherence.saturating_add(timing).saturating_add(risk),
        }
    }
}

/// Stateless calculator parameterized by [`DisciplineConfig`].
#[derive(Debug, Clone, Default)]
pub struct DisciplineScorer {
    config: DisciplineConfig,
}

impl DisciplineScorer {
    pub fn new(config: DisciplineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DisciplineConfig {
        &self.config
    }

    pub fn score(&self, planned: &PlannedParams, executed: &ExecutedParams) -> DisciplineBreakdown {
        let breakdown = DisciplineBreakdown::new(
            self.adherence(planned, executed),
            self.timing(planned, executed),
            self.risk(planned, executed),
        );
        debug!(
            adherence = breakdown.adherence,
            timing = breakdown.timing,
            risk = breakdown.risk,
            total = breakdown.total,
            "scored trade"
        );
        breakdown
    }

    fn adherence(&self, planned: &PlannedParams, executed: &ExecutedParams) -> u32 {
        let c = &self.config;
        let mut penalty: u32 = 0;
        if differs(planned.strike, executed.strike) {
            penalty = penalty.saturating_add(c.strike_penalty);
        }
        if expirations_differ(planned.expiration.as_ref(), executed.expiration.as_ref()) {
            penalty = penalty.saturating_add(c.expiration_penalty);
        }
        if differs(planned.contracts, executed.contracts) {
            penalty = penalty.saturating_add(c.contracts_penalty);
        }
        c.adherence_ceiling.saturating_sub(penalty)
    }

    fn timing(&self, planned: &PlannedParams, executed: &ExecutedParams) -> u32 {
        let c = &self.config;
        let (Some(plan), Some(fill)) = (&planned.planned_entry_time, &executed.executed_at) else {
            return c.timing_ceiling;
        };
        let (Ok(plan), Ok(fill)) = (plan.to_instant(), fill.to_instant()) else {
            trace!("entry time unparseable, timing not evaluated");
            return c.timing_ceiling;
        };

        let minutes = minutes_between(plan, fill);
        let mut penalty: u32 = 0;
        if minutes > c.late_threshold_minutes {
            penalty = penalty.saturating_add(c.late_penalty);
        }
        if minutes > c.very_late_threshold_minutes {
            penalty = penalty.saturating_add(c.very_late_penalty);
        }
        c.timing_ceiling.saturating_sub(penalty)
    }

    fn risk(&self, planned: &PlannedParams, executed: &ExecutedParams) -> u32 {
        let c = &self.config;
        let dollar_risk = self.dollar_risk(planned, executed);
        let mut penalty: u32 = 0;

        if let Some(max_dollar) = planned.max_risk_dollar {
            if dollar_risk > max_dollar {
                penalty = penalty.saturating_add(c.dollar_risk_penalty);
            }
        }

        if let Some(max_pct) = planned.max_risk_percent {
            let account = planned.account_size.unwrap_or(c.default_account_size);
            if account > 0.0 && dollar_risk / account * 100.0 > max_pct {
                penalty = penalty.saturating_add(c.percent_risk_penalty);
            }
        }

        c.risk_ceiling.saturating_sub(penalty)
    }

    /// Position size in shares: the plan's explicit size, else contracts × contract size.
    pub fn position_shares(&self, planned: &PlannedParams, executed: &ExecutedParams) -> f64 {
        if let Some(size) = planned.position_size {
            return size;
        }
        let contracts = executed.contracts.or(planned.contracts).unwrap_or(0.0);
        if contracts > 0.0 {
            contracts * planned.contract_size.unwrap_or(self.config.default_contract_size)
        } else {
            0.0
        }
    }

    /// Dollars at risk between the fill price and the planned stop.
    ///
    /// Zero when the stop, the fill price, or a positive size is missing.
    pub fn dollar_risk(&self, planned: &PlannedParams, executed: &ExecutedParams) -> f64 {
        let shares = self.position_shares(planned, executed);
        match (planned.stop_loss, executed.entry_price) {
            (Some(stop), Some(entry)) if shares > 0.0 => (entry - stop).abs() * shares,
            _ => 0.0,
        }
    }
}

/// Score a trade with the stock thresholds.
pub fn score(planned: &PlannedParams, executed: &ExecutedParams) -> DisciplineBreakdown {
    DisciplineScorer::default().score(planned, executed)
}

fn differs(planned: Option<f64>, executed: Option<f64>) -> bool {
    matches!((planned, executed), (Some(p), Some(e)) if p != e)
}

/// Compare as instants when both parse, else fall back to raw-value inequality.
fn expirations_differ(planned: Option<&DateLike>, executed: Option<&DateLike>) -> bool {
    let (Some(p), Some(e)) = (planned, executed) else {
        return false;
    };
    match (p.to_instant(), e.to_instant()) {
        (Ok(a), Ok(b)) => a != b,
        _ => {
            trace!(?p, ?e, "expiration unparseable, comparing raw values");
            p != e
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> PlannedParams {
        PlannedParams {
            strike: Some(100.0),
            expiration: Some(DateLike::from("2024-01-19")),
            contracts: Some(1.0),
            planned_entry_time: Some(DateLike::from("2024-01-10T14:30:00Z")),
            ..Default::default()
        }
    }

    fn fill() -> ExecutedParams {
        ExecutedParams {
            strike: Some(100.0),
            expiration: Some(DateLike::from("2024-01-19")),
            contracts: Some(1.0),
            executed_at: Some(DateLike::from("2024-01-10T14:30:00Z")),
            ..Default::default()
        }
    }

    #[test]
    fn perfect_trade_scores_100() {
        let b = score(&plan(), &fill());
        assert_eq!(
            b,
            DisciplineBreakdown {
                adherence: 40,
                timing: 30,
                risk: 30,
                total: 100
            }
        );
    }

    #[test]
    fn strike_mismatch_costs_15() {
        let mut e = fill();
        e.strike = Some(95.0);
        assert_eq!(score(&plan(), &e).adherence, 25);
    }

    #[test]
    fn contract_mismatch_costs_15() {
        let mut e = fill();
        e.contracts = Some(2.0);
        assert_eq!(score(&plan(), &e).adherence, 25);
    }

    #[test]
    fn expiration_compared_as_instants_across_shapes() {
        let mut e = fill();
        // 2024-01-19T00:00:00Z as epoch millis
        e.expiration = Some(DateLike::from(1_705_622_400_000_i64));
        assert_eq!(score(&plan(), &e).adherence, 40);

        e.expiration = Some(DateLike::from("2024-01-26"));
        assert_eq!(score(&plan(), &e).adherence, 30);
    }

    #[test]
    fn unparseable_expirations_fall_back_to_raw_comparison() {
        let mut p = plan();
        let mut e = fill();
        p.expiration = Some(DateLike::from("Jan weekly"));
        e.expiration = Some(DateLike::from("Jan weekly"));
        assert_eq!(score(&p, &e).adherence, 40);

        e.expiration = Some(DateLike::from("Feb weekly"));
        assert_eq!(score(&p, &e).adherence, 30);

        // One side parses, the other doesn't: raw values differ.
        e.expiration = Some(DateLike::from("2024-01-19"));
        assert_eq!(score(&p, &e).adherence, 30);
    }

    #[test]
    fn one_sided_fields_are_not_evaluated() {
        let mut e = fill();
        e.strike = None;
        e.expiration = None;
        e.contracts = None;
        assert_eq!(score(&plan(), &e).adherence, 40);
    }

    #[test]
    fn timing_thresholds() {
        let cases = [
            ("2024-01-10T15:00:00Z", 30), // exactly 30 min: not late
            ("2024-01-10T15:01:00Z", 20),
            ("2024-01-10T15:30:00Z", 20), // exactly 60 min
            ("2024-01-10T15:31:00Z", 0),
            ("2024-01-10T13:00:00Z", 0), // early counts the same as late
        ];
        for (at, expected) in cases {
            let mut e = fill();
            e.executed_at = Some(DateLike::from(at));
            assert_eq!(score(&plan(), &e).timing, expected, "executed at {at}");
        }
    }

    #[test]
    fn unparseable_entry_time_skips_timing() {
        let mut e = fill();
        e.executed_at = Some(DateLike::from("after lunch"));
        assert_eq!(score(&plan(), &e).timing, 30);
    }

    #[test]
    fn dollar_risk_uses_contracts_and_contract_size() {
        let scorer = DisciplineScorer::default();
        let p = PlannedParams {
            stop_loss: Some(90.0),
            contracts: Some(3.0),
            ..Default::default()
        };
        let e = ExecutedParams {
            entry_price: Some(100.0),
            contracts: Some(2.0),
            ..Default::default()
        };
        // Executed contracts win over planned: 2 × 100 shares × $10.
        assert_eq!(scorer.dollar_risk(&p, &e), 2000.0);
    }

    #[test]
    fn explicit_position_size_overrides_contracts() {
        let scorer = DisciplineScorer::default();
        let p = PlannedParams {
            stop_loss: Some(48.0),
            position_size: Some(50.0),
            contracts: Some(5.0),
            ..Default::default()
        };
        let e = ExecutedParams {
            entry_price: Some(50.0),
            ..Default::default()
        };
        assert_eq!(scorer.dollar_risk(&p, &e), 100.0);
    }

    #[test]
    fn risk_limits_each_cost_15() {
        let p = PlannedParams {
            stop_loss: Some(90.0),
            account_size: Some(10_000.0),
            max_risk_dollar: Some(500.0),
            max_risk_percent: Some(2.0),
            ..Default::default()
        };
        let e = ExecutedParams {
            entry_price: Some(100.0),
            contracts: Some(1.0),
            ..Default::default()
        };
        // $1000 at risk: above $500 and above 2% of $10k.
        assert_eq!(score(&p, &e).risk, 0);

        let mut relaxed = p.clone();
        relaxed.max_risk_dollar = Some(1000.0);
        assert_eq!(score(&relaxed, &e).risk, 15);
    }

    #[test]
    fn account_size_defaults_to_10k() {
        let p = PlannedParams {
            stop_loss: Some(99.0),
            max_risk_percent: Some(0.5),
            ..Default::default()
        };
        let e = ExecutedParams {
            entry_price: Some(100.0),
            contracts: Some(1.0),
            ..Default::default()
        };
        // $100 / $10,000 = 1% > 0.5%
        assert_eq!(score(&p, &e).risk, 15);
    }

    #[test]
    fn no_stop_loss_means_no_risk_penalty() {
        let p = PlannedParams {
            max_risk_dollar: Some(0.0),
            max_risk_percent: Some(0.0),
            ..Default::default()
        };
        assert_eq!(score(&p, &fill()).risk, 30);
    }

    #[test]
    fn custom_config_changes_penalties() {
        let scorer = DisciplineScorer::new(DisciplineConfig {
            strike_penalty: 40,
            ..Default::default()
        });
        let mut e = fill();
        e.strike = Some(101.0);
        e.contracts = Some(4.0);
        let b = scorer.score(&plan(), &e);
        assert_eq!(b.adherence, 0);
        assert_eq!(b.total, 60);
    }

    #[test]
    fn oversized_penalties_clamp_to_zero() {
        let config = crate::config::AnalyticsConfig::from_toml_str(
            "[discipline]\nstrike_penalty = 4294967295\ncontracts_penalty = 1\n",
        )
        .unwrap();
        let scorer = DisciplineScorer::new(config.discipline);
        let mut e = fill();
        e.strike = Some(95.0);
        e.contracts = Some(2.0);
        let b = scorer.score(&plan(), &e);
        assert_eq!(b.adherence, 0);
        assert_eq!(b.total, 60);
    }
}
