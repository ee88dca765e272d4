//! Strategy health as a full reduction over a strategy's closed cycles.
//!
//! Every call recomputes the snapshot from the complete, start-ordered cycle
//! history. There is no incremental path: callers replace any prior snapshot
//! wholesale.

use serde::{Deserialize, Serialize};
use tracing::debug;
use wheellab_core::domain::{Cycle, CycleId, Regime, StrategyId};
use wheellab_core::DateLike;

use crate::config::HealthConfig;

/// Weakness tags, each raised independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaknessFlag {
    /// The latest cycle's discipline score is below the floor.
    DisciplineSlipping,
    /// The trailing window of cycles all lost money.
    RecentLosses,
}

impl WeaknessFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisciplineSlipping => "discipline_slipping",
            Self::RecentLosses => "recent_losses",
        }
    }
}

/// Aggregate over all cycles sharing one regime label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimePerformance {
    /// Total realized P&L.
    pub pnl: f64,
    /// Fraction of cycles with positive realized P&L.
    pub win_rate: f64,
    pub avg_discipline: f64,
}

/// Flattened view of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub cycle_id: CycleId,
    /// Realized plus unrealized.
    pub pnl: f64,
    pub discipline_score: f64,
    pub regime: Option<Regime>,
    pub started_at: Option<DateLike>,
    pub closed_at: Option<DateLike>,
}

/// Derived, fully replaceable health view of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub strategy_id: StrategyId,
    pub pnl_trend: Vec<f64>,
    pub discipline_trend: Vec<f64>,
    /// Keyed by regime label in order of first appearance.
    #[serde(with = "wheellab_core::ordered")]
    pub regime_performance: Vec<(String, RegimePerformance)>,
    pub cycle_summaries: Vec<CycleSummary>,
    pub regime_weaknesses: Vec<WeaknessFlag>,
    pub current_regime: Option<Regime>,
    pub current_regime_hint: Option<String>,
}

impl HealthSnapshot {
    /// Snapshot of a strategy with no closed cycles.
    pub fn empty(strategy_id: StrategyId) -> Self {
        Self {
            strategy_id,
            pnl_trend: Vec::new(),
            discipline_trend: Vec::new(),
            regime_performance: Vec::new(),
            cycle_summaries: Vec::new(),
            regime_weaknesses: Vec::new(),
            current_regime: None,
            current_regime_hint: None,
        }
    }

    pub fn regime(&self, label: &str) -> Option<&RegimePerformance> {
        wheellab_core::ordered::get(&self.regime_performance, label)
    }

    pub fn has_flag(&self, flag: WeaknessFlag) -> bool {
        self.regime_weaknesses.contains(&flag)
    }
}

/// Guidance text for the regime of the most recent cycle.
pub fn regime_hint(regime: Option<&Regime>) -> &'static str {
    match regime {
        Some(Regime::Uptrend) => "Strategy performs best selling premium in strength.",
        Some(Regime::Downtrend) => "Strategy may require defensive adjustments.",
        Some(Regime::Sideways) => "Neutral conditions favor income strategies.",
        _ => "No regime signal available.",
    }
}

#[derive(Default)]
struct RegimeTally {
    count: usize,
    wins: usize,
    total_pnl: f64,
    total_discipline: f64,
}

/// Stateless reducer parameterized by [`HealthConfig`].
#[derive(Debug, Clone, Default)]
pub struct HealthAggregator {
    config: HealthConfig,
}

impl HealthAggregator {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    /// Reduce `cycles` (ordered by start time, ascending) into a snapshot.
    pub fn compute_snapshot(&self, strategy_id: StrategyId, cycles: &[Cycle]) -> HealthSnapshot {
        let Some(last) = cycles.last() else {
            debug!(strategy = %strategy_id, "no cycles, empty snapshot");
            return HealthSnapshot::empty(strategy_id);
        };

        let pnl_trend: Vec<f64> = cycles.iter().map(Cycle::combined_pnl).collect();
        let discipline_trend: Vec<f64> = cycles.iter().map(Cycle::discipline).collect();
        let regime_weaknesses = self.weaknesses(&pnl_trend, &discipline_trend);
        let current_regime = last.dominant_regime.clone();
        let current_regime_hint = Some(regime_hint(current_regime.as_ref()).to_string());

        let snapshot = HealthSnapshot {
            strategy_id,
            regime_performance: regime_performance(cycles),
            cycle_summaries: cycles.iter().map(summarize).collect(),
            pnl_trend,
            discipline_trend,
            regime_weaknesses,
            current_regime,
            current_regime_hint,
        };
        debug!(
            strategy = %snapshot.strategy_id,
            cycles = cycles.len(),
            regimes = snapshot.regime_performance.len(),
            flags = snapshot.regime_weaknesses.len(),
            "health snapshot computed"
        );
        snapshot
    }

    fn weaknesses(&self, pnl_trend: &[f64], discipline_trend: &[f64]) -> Vec<WeaknessFlag> {
        let mut flags = Vec::new();

        if discipline_trend
            .last()
            .is_some_and(|&d| d < self.config.discipline_floor)
        {
            flags.push(WeaknessFlag::DisciplineSlipping);
        }

        let window = self.config.loss_window;
        if window > 0 && pnl_trend.len() >= window {
            let tail = &pnl_trend[pnl_trend.len() - window..];
            if tail.iter().all(|&p| p < 0.0) {
                flags.push(WeaknessFlag::RecentLosses);
            }
        }

        flags
    }
}

/// Snapshot with the stock thresholds.
pub fn compute_snapshot(strategy_id: StrategyId, cycles: &[Cycle]) -> HealthSnapshot {
    HealthAggregator::default().compute_snapshot(strategy_id, cycles)
}

/// Group by regime label (missing label → `"unknown"`), first appearance first.
pub fn regime_performance(cycles: &[Cycle]) -> Vec<(String, RegimePerformance)> {
    let mut tallies: Vec<(String, RegimeTally)> = Vec::new();

    for cycle in cycles {
        let key = cycle.regime_key();
        let idx = match tallies.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                tallies.push((key.to_string(), RegimeTally::default()));
                tallies.len() - 1
            }
        };
        let tally = &mut tallies[idx].1;
        tally.count += 1;
        tally.total_pnl += cycle.realized();
        tally.total_discipline += cycle.discipline();
        if cycle.is_winner() {
            tally.wins += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(regime, t)| {
            let n = t.count as f64;
            let perf = RegimePerformance {
                pnl: t.total_pnl,
                win_rate: t.wins as f64 / n,
                avg_discipline: t.total_discipline / n,
            };
            (regime, perf)
        })
        .collect()
}

fn summarize(cycle: &Cycle) -> CycleSummary {
    CycleSummary {
        cycle_id: cycle.id.clone(),
        pnl: cycle.combined_pnl(),
        discipline_score: cycle.discipline(),
        regime: cycle.dominant_regime.clone(),
        started_at: cycle.started_at.clone(),
        closed_at: cycle.closed_at.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(id: &str, realized: f64, discipline: f64, regime: Option<&str>) -> Cycle {
        Cycle {
            id: CycleId::from(id),
            realized_pnl: Some(realized),
            discipline_score: Some(discipline),
            dominant_regime: regime.map(Regime::from),
            ..Default::default()
        }
    }

    #[test]
    fn empty_history_gives_empty_snapshot() {
        let s = compute_snapshot(StrategyId::from("s1"), &[]);
        assert_eq!(s, HealthSnapshot::empty(StrategyId::from("s1")));
        let json = serde_json::to_value(&s).unwrap();
        assert!(json["currentRegime"].is_null());
        assert!(json["currentRegimeHint"].is_null());
        assert_eq!(json["regimePerformance"], serde_json::json!({}));
    }

    #[test]
    fn trends_include_unrealized_pnl() {
        let mut c = cycle("c1", 50.0, 80.0, None);
        c.unrealized_pnl = Some(-20.0);
        let s = compute_snapshot(StrategyId::from("s1"), &[c]);
        assert_eq!(s.pnl_trend, vec![30.0]);
        assert_eq!(s.discipline_trend, vec![80.0]);
        // Regime table uses realized P&L only.
        assert_eq!(s.regime("unknown").unwrap().pnl, 50.0);
    }

    #[test]
    fn regime_table_keeps_first_appearance_order() {
        let cycles = [
            cycle("a", 10.0, 70.0, Some("sideways")),
            cycle("b", 10.0, 70.0, Some("uptrend")),
            cycle("c", 10.0, 70.0, None),
            cycle("d", 10.0, 70.0, Some("sideways")),
        ];
        let s = compute_snapshot(StrategyId::from("s1"), &cycles);
        let keys: Vec<&str> = s.regime_performance.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["sideways", "uptrend", "unknown"]);
        assert_eq!(s.regime("sideways").unwrap().pnl, 20.0);
    }

    #[test]
    fn average_discipline_per_regime() {
        let cycles = [
            cycle("a", 1.0, 60.0, Some("downtrend")),
            cycle("b", 1.0, 90.0, Some("downtrend")),
        ];
        let s = compute_snapshot(StrategyId::from("s1"), &cycles);
        assert_eq!(s.regime("downtrend").unwrap().avg_discipline, 75.0);
    }

    #[test]
    fn discipline_floor_is_strict() {
        let s = compute_snapshot(StrategyId::from("s1"), &[cycle("a", 5.0, 60.0, None)]);
        assert!(!s.has_flag(WeaknessFlag::DisciplineSlipping));
        let s = compute_snapshot(StrategyId::from("s1"), &[cycle("a", 5.0, 59.9, None)]);
        assert!(s.has_flag(WeaknessFlag::DisciplineSlipping));
    }

    #[test]
    fn recent_losses_needs_a_full_window() {
        let two = [cycle("a", -1.0, 80.0, None), cycle("b", -1.0, 80.0, None)];
        let s = compute_snapshot(StrategyId::from("s1"), &two);
        assert!(!s.has_flag(WeaknessFlag::RecentLosses));

        let mut three = two.to_vec();
        three.push(cycle("c", -1.0, 80.0, None));
        let s = compute_snapshot(StrategyId::from("s1"), &three);
        assert!(s.has_flag(WeaknessFlag::RecentLosses));
    }

    #[test]
    fn break_even_cycle_is_not_a_loss() {
        let cycles = [
            cycle("a", -1.0, 80.0, None),
            cycle("b", 0.0, 80.0, None),
            cycle("c", -1.0, 80.0, None),
        ];
        let s = compute_snapshot(StrategyId::from("s1"), &cycles);
        assert!(!s.has_flag(WeaknessFlag::RecentLosses));
    }

    #[test]
    fn flags_are_ordered_discipline_first() {
        let cycles = [
            cycle("a", -1.0, 80.0, None),
            cycle("b", -1.0, 80.0, None),
            cycle("c", -1.0, 45.0, None),
        ];
        let s = compute_snapshot(StrategyId::from("s1"), &cycles);
        assert_eq!(
            s.regime_weaknesses,
            vec![WeaknessFlag::DisciplineSlipping, WeaknessFlag::RecentLosses]
        );
    }

    #[test]
    fn hint_follows_last_cycle_regime() {
        let cycles = [
            cycle("a", 1.0, 80.0, Some("uptrend")),
            cycle("b", 1.0, 80.0, Some("sideways")),
        ];
        let s = compute_snapshot(StrategyId::from("s1"), &cycles);
        assert_eq!(s.current_regime, Some(Regime::Sideways));
        assert_eq!(
            s.current_regime_hint.as_deref(),
            Some("Neutral conditions favor income strategies.")
        );
    }

    #[test]
    fn unlabeled_last_cycle_has_no_signal_hint() {
        let s = compute_snapshot(StrategyId::from("s1"), &[cycle("a", 1.0, 80.0, None)]);
        assert_eq!(s.current_regime, None);
        assert_eq!(s.current_regime_hint.as_deref(), Some("No regime signal available."));

        let s = compute_snapshot(StrategyId::from("s1"), &[cycle("a", 1.0, 80.0, Some("choppy"))]);
        assert_eq!(s.current_regime_hint.as_deref(), Some("No regime signal available."));
    }

    #[test]
    fn summaries_preserve_order_and_timestamps() {
        let mut a = cycle("a", 1.0, 80.0, Some("uptrend"));
        a.started_at = Some(DateLike::from("2024-01-02"));
        let b = cycle("b", 2.0, 70.0, None);
        let s = compute_snapshot(StrategyId::from("s1"), &[a, b]);
        assert_eq!(s.cycle_summaries[0].cycle_id, CycleId::from("a"));
        assert_eq!(s.cycle_summaries[0].started_at, Some(DateLike::from("2024-01-02")));
        assert_eq!(s.cycle_summaries[1].closed_at, None);
        assert_eq!(s.cycle_summaries[1].regime, None);
    }

    #[test]
    fn custom_thresholds() {
        let agg = HealthAggregator::new(HealthConfig {
            discipline_floor: 90.0,
            loss_window: 1,
        });
        let s = agg.compute_snapshot(StrategyId::from("s1"), &[cycle("a", -3.0, 85.0, None)]);
        assert_eq!(
            s.regime_weaknesses,
            vec![WeaknessFlag::DisciplineSlipping, WeaknessFlag::RecentLosses]
        );
    }
}
