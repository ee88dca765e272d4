//! Batch comparison: best/worst configuration across a finished sweep.
//!
//! Runs are ranked by a composite score, `pnl − maxDrawdown + winRate × 100`.
//! Selection is a stable scan: a later run replaces the current pick only when
//! strictly better, so ties go to the first run encountered.
//!
//! [`compute_batch_summary`] assumes every run it is given is complete; that
//! gate belongs to the caller. [`finalize_batch`] applies the gate itself for
//! callers that want it checked.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use wheellab_core::domain::{Batch, Run, RunMetrics};

/// Narrative used when there is nothing to compare.
pub const NO_COMPARISON: &str = "No comparison available.";

/// Derived comparison over a fixed set of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub best_config: Option<Map<String, Value>>,
    pub worst_config: Option<Map<String, Value>>,
    /// Regime label → note, in order of first appearance.
    #[serde(with = "wheellab_core::ordered")]
    pub regime_weaknesses: Vec<(String, String)>,
    pub summary_note: String,
}

/// Ranking scalar of a run. Missing metrics count as zero.
pub fn composite_score(metrics: &RunMetrics) -> f64 {
    let pnl = metrics.pnl.unwrap_or(0.0);
    let drawdown = metrics.max_drawdown.unwrap_or(0.0);
    let win_rate = metrics.win_rate.unwrap_or(0.0);
    pnl - drawdown + win_rate * 100.0
}

/// Highest composite score; first run wins ties.
pub fn find_best(runs: &[Run]) -> Option<&Run> {
    select(runs, |candidate, current| candidate > current)
}

/// Lowest composite score; first run wins ties.
pub fn find_worst(runs: &[Run]) -> Option<&Run> {
    select(runs, |candidate, current| candidate < current)
}

fn select(runs: &[Run], replaces: impl Fn(f64, f64) -> bool) -> Option<&Run> {
    let mut pick: Option<(&Run, f64)> = None;
    for run in runs {
        let score = composite_score(&run.metrics);
        match pick {
            Some((_, current)) if !replaces(score, current) => {}
            _ => pick = Some((run, score)),
        }
    }
    pick.map(|(run, _)| run)
}

/// Mean per-regime P&L across all runs' breakdowns, turned into notes.
///
/// Regimes with an exactly zero mean get no note.
pub fn regime_weaknesses(runs: &[Run]) -> Vec<(String, String)> {
    let mut totals: Vec<(String, f64, usize)> = Vec::new();
    for run in runs {
        for (regime, result) in &run.regime_breakdown {
            let pnl = result.pnl.unwrap_or(0.0);
            match totals.iter_mut().find(|(k, _, _)| k == regime) {
                Some((_, sum, count)) => {
                    *sum += pnl;
                    *count += 1;
                }
                None => totals.push((regime.clone(), pnl, 1)),
            }
        }
    }

    totals
        .into_iter()
        .filter_map(|(regime, sum, count)| {
            let mean = sum / count as f64;
            let note = if mean < 0.0 {
                format!("Strategy tends to lose in {regime} conditions.")
            } else if mean > 0.0 {
                format!("Strategy tends to perform well in {regime} conditions.")
            } else {
                return None;
            };
            Some((regime, note))
        })
        .collect()
}

/// Deterministic narrative: best config, worst config, then regime notes.
pub fn summary_note(best: Option<&Run>, worst: Option<&Run>, notes: &[(String, String)]) -> String {
    let Some(best) = best else {
        return NO_COMPARISON.to_string();
    };

    let mut parts = vec![format!("Best configuration found: {}.", params_json(best))];
    if let Some(worst) = worst {
        parts.push(format!("Weak configuration: {}.", params_json(worst)));
    }
    if !notes.is_empty() {
        parts.push("Regime notes:".to_string());
        parts.extend(notes.iter().map(|(_, note)| format!("- {note}")));
    }
    parts.join(" ")
}

fn params_json(run: &Run) -> String {
    let params = run.parameters.clone().unwrap_or_default();
    Value::Object(params).to_string()
}

/// Summarize a set of complete runs.
pub fn compute_batch_summary(runs: &[Run]) -> BatchSummary {
    let best = find_best(runs);
    let worst = find_worst(runs);
    let regime_weaknesses = regime_weaknesses(runs);
    let summary_note = summary_note(best, worst, &regime_weaknesses);

    debug!(
        runs = runs.len(),
        best = best.map(|r| r.run_id.as_str()),
        worst = worst.map(|r| r.run_id.as_str()),
        notes = regime_weaknesses.len(),
        "batch summary computed"
    );

    BatchSummary {
        best_config: best.and_then(|r| r.parameters.clone()),
        worst_config: worst.and_then(|r| r.parameters.clone()),
        regime_weaknesses,
        summary_note,
    }
}

/// Whether a batch can be summarized yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchReadiness {
    /// The batch lists no runs; nothing to summarize.
    Empty,
    /// Some supplied runs are not complete yet.
    Pending { complete: usize, total: usize },
    Ready { summary: BatchSummary },
}

/// Summarize `batch` once every supplied run it references is complete.
///
/// `runs` may arrive in any order and may include runs from other batches.
/// Referenced ids with no supplied run are skipped; if none remain the summary
/// is the empty comparison. The summary follows `run_ids` order.
pub fn finalize_batch(batch: &Batch, runs: &[Run]) -> BatchReadiness {
    if batch.run_ids.is_empty() {
        return BatchReadiness::Empty;
    }

    let referenced: Vec<&Run> = batch
        .run_ids
        .iter()
        .filter_map(|id| runs.iter().find(|r| &r.run_id == id))
        .collect();
    let missing = batch.run_ids.len() - referenced.len();
    if missing > 0 {
        debug!(batch = %batch.batch_id, missing, "skipping referenced runs that were not supplied");
    }

    let complete = referenced.iter().filter(|r| r.is_complete()).count();
    let total = referenced.len();
    if complete < total {
        debug!(batch = %batch.batch_id, complete, total, "batch still pending");
        return BatchReadiness::Pending { complete, total };
    }

    let ordered: Vec<Run> = referenced.into_iter().cloned().collect();
    BatchReadiness::Ready {
        summary: compute_batch_summary(&ordered),
    }
}
