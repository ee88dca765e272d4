//! Export of derived artifacts as JSON and CSV.
//!
//! - **JSON**: pretty-printed, for any artifact
//! - **CSV**: per-cycle summaries of a health snapshot, and a ranked view of a
//!   batch's runs for spreadsheet review

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use wheellab_core::domain::Run;
use wheellab_core::DateLike;

use crate::batch::composite_score;
use crate::health::HealthSnapshot;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize any artifact to pretty JSON.
pub fn export_json<T: Serialize>(artifact: &T) -> Result<String> {
    serde_json::to_string_pretty(artifact).context("failed to serialize artifact to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per cycle, in snapshot order.
///
/// Columns: cycle_id, pnl, discipline_score, regime, started_at, closed_at.
/// Timestamps are written as RFC 3339 when they parse, raw JSON otherwise.
pub fn export_cycle_summaries_csv(snapshot: &HealthSnapshot) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "cycle_id",
        "pnl",
        "discipline_score",
        "regime",
        "started_at",
        "closed_at",
    ])?;

    for c in &snapshot.cycle_summaries {
        wtr.write_record([
            c.cycle_id.as_str(),
            &format!("{:.2}", c.pnl),
            &format!("{:.1}", c.discipline_score),
            c.regime.as_ref().map_or("", |r| r.as_str()),
            &timestamp_cell(c.started_at.as_ref()),
            &timestamp_cell(c.closed_at.as_ref()),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per run, in input order.
///
/// Columns: run_id, status, composite_score, pnl, max_drawdown, win_rate, parameters.
pub fn export_batch_csv(runs: &[Run]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "run_id",
        "status",
        "composite_score",
        "pnl",
        "max_drawdown",
        "win_rate",
        "parameters",
    ])?;

    for r in runs {
        let status = serde_json::to_value(r.status)?;
        let params = Value::Object(r.parameters.clone().unwrap_or_default());
        wtr.write_record([
            r.run_id.as_str(),
            status.as_str().unwrap_or_default(),
            &format!("{:.4}", composite_score(&r.metrics)),
            &optional_cell(r.metrics.pnl),
            &optional_cell(r.metrics.max_drawdown),
            &optional_cell(r.metrics.win_rate),
            &params.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn timestamp_cell(value: Option<&DateLike>) -> String {
    match value {
        None => String::new(),
        Some(d) => match d.to_instant() {
            Ok(dt) => dt.to_rfc3339(),
            Err(_) => serde_json::to_string(d).unwrap_or_default(),
        },
    }
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}
