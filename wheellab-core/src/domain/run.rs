//! Backtest runs and the batches that group them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::ids::{BatchId, RunId, StrategyId};
use crate::lenient;

/// Lifecycle state of a run. Only `Complete` is terminal for batch purposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Complete,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Headline metrics of a finished run.
///
/// Read from any JSON shape: a non-object or wrongly typed field yields zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct RunMetrics {
    pub pnl: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub win_rate: Option<f64>,
}

impl RunMetrics {
    pub fn new(pnl: f64, max_drawdown: f64, win_rate: f64) -> Self {
        Self {
            pnl: Some(pnl),
            max_drawdown: Some(max_drawdown),
            win_rate: Some(win_rate),
        }
    }
}

impl From<Value> for RunMetrics {
    fn from(value: Value) -> Self {
        let field = |key: &str| value.get(key).and_then(lenient::as_number);
        Self {
            pnl: field("pnl"),
            max_drawdown: field("maxDrawdown"),
            win_rate: field("winRate"),
        }
    }
}

/// A run's result within one market regime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RegimeResult {
    pub pnl: Option<f64>,
}

impl From<Value> for RegimeResult {
    fn from(value: Value) -> Self {
        Self {
            pnl: value.get("pnl").and_then(lenient::as_number),
        }
    }
}

/// One backtest execution inside a batch. Immutable once complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    #[serde(default)]
    pub run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: RunStatus,
    /// Parameter set the run was executed with, in document key order.
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameters: Option<Map<String, Value>>,
    #[serde(default)]
    pub metrics: RunMetrics,
    #[serde(
        default,
        serialize_with = "crate::ordered::serialize",
        deserialize_with = "lenient::entries"
    )]
    pub regime_breakdown: Vec<(String, RegimeResult)>,
}

impl Run {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }
}

/// Missing or `null` is `Pending`; any other non-label shape is `Unknown`.
fn lenient_status<'de, D>(deserializer: D) -> Result<RunStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => RunStatus::Pending,
        Some(v) => serde_json::from_value(v).unwrap_or(RunStatus::Unknown),
    })
}

/// A parameter sweep: the run ids that must all complete before summarizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    #[serde(default)]
    pub batch_id: BatchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<StrategyId>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub run_ids: Vec<RunId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
