//! Wire types of the remote backtest engine.
//!
//! The engine is an opaque request/response service: a configuration record
//! goes in, a `BacktestResult` comes out. The analytics stages never read these
//! types; they exist so callers can talk to the engine with typed payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a `run-backtest` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    pub config_used: Map<String, Value>,
}

/// Envelope of a `run-backtest` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub backtest_result: BacktestResult,
}

/// Full result of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BacktestResult {
    pub config_used: Map<String, Value>,
    pub equity_curve: Vec<f64>,
    pub max_drawdown: f64,
    pub total_return: f64,
    pub cycles_completed: u32,
    pub notes: Vec<String>,
    pub cycles: Vec<CycleStats>,
    pub avg_cycle_return: f64,
    pub avg_cycle_duration_days: f64,
    pub assignment_rate: f64,
    pub uptrend_avg_cycle_return: f64,
    pub downtrend_avg_cycle_return: f64,
    pub sideways_avg_cycle_return: f64,
    pub uptrend_assignment_rate: f64,
    pub downtrend_assignment_rate: f64,
    pub sideways_assignment_rate: f64,
    pub engine_version: String,
    pub regime_segments: Vec<RegimeSegment>,
}

/// Per-cycle statistics reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CycleStats {
    pub cycle_id: String,
    pub index: u32,
    pub start_equity: f64,
    pub end_equity: f64,
    pub duration_days: f64,
    pub had_assignment: bool,
    pub outcome: Option<String>,
    pub dominant_regime: Option<String>,
    pub start_index: Option<u32>,
    pub end_index: Option<u32>,
    pub assignment_price: Option<f64>,
    pub assignment_strike: Option<f64>,
    pub called_away_price: Option<f64>,
    pub called_away_strike: Option<f64>,
}

impl CycleStats {
    pub fn return_pct(&self) -> f64 {
        if self.start_equity <= 0.0 {
            return 0.0;
        }
        (self.end_equity - self.start_equity) / self.start_equity
    }
}

/// A contiguous stretch of bars labeled with one regime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegimeSegment {
    pub regime: String,
    pub start_date: String,
    pub end_date: String,
    pub start_index: u32,
    pub end_index: u32,
}
