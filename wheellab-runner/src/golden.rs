//! Golden fixtures: shared input/expected-output pairs for conformance.
//!
//! Any other engine that implements the same analytics can be checked against
//! the same fixture files. Each fixture is one JSON document:
//!
//! ```json
//! { "name": "...", "kind": "health", "input": { ... }, "expected": { ... } }
//! ```
//!
//! Numbers compare within `1e-9`; object key order is not significant.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use wheellab_core::domain::{Cycle, ExecutedParams, PlannedParams, Run, StrategyId};

use crate::config::AnalyticsConfig;
use crate::discipline::DisciplineScorer;
use crate::health::HealthAggregator;

const NUMERIC_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum GoldenError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed fixture {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Which analytics stage a fixture exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoldenKind {
    Discipline,
    Health,
    Batch,
}

#[derive(Debug, Deserialize)]
struct DisciplineInput {
    planned: PlannedParams,
    executed: ExecutedParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthInput {
    strategy_id: StrategyId,
    cycles: Vec<Cycle>,
}

#[derive(Debug, Deserialize)]
struct BatchInput {
    runs: Vec<Run>,
}

/// One fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenCase {
    pub name: String,
    pub kind: GoldenKind,
    pub input: Value,
    pub expected: Value,
}

/// Result of checking one fixture.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenOutcome {
    pub name: String,
    pub passed: bool,
    /// BLAKE3 digest of the computed artifact.
    pub digest: String,
    pub actual: Value,
}

impl GoldenCase {
    /// Run the fixture's stage over its input.
    pub fn compute(&self, config: &AnalyticsConfig) -> Result<Value, GoldenError> {
        let malformed = |source| GoldenError::Malformed {
            name: self.name.clone(),
            source,
        };
        let artifact = match self.kind {
            GoldenKind::Discipline => {
                let input: DisciplineInput =
                    serde_json::from_value(self.input.clone()).map_err(malformed)?;
                let scorer = DisciplineScorer::new(config.discipline.clone());
                serde_json::to_value(scorer.score(&input.planned, &input.executed))
            }
            GoldenKind::Health => {
                let input: HealthInput =
                    serde_json::from_value(self.input.clone()).map_err(malformed)?;
                let aggregator = HealthAggregator::new(config.health.clone());
                serde_json::to_value(aggregator.compute_snapshot(input.strategy_id, &input.cycles))
            }
            GoldenKind::Batch => {
                let input: BatchInput =
                    serde_json::from_value(self.input.clone()).map_err(malformed)?;
                serde_json::to_value(crate::batch::compute_batch_summary(&input.runs))
            }
        };
        artifact.map_err(malformed)
    }

    pub fn check(&self, config: &AnalyticsConfig) -> Result<GoldenOutcome, GoldenError> {
        let actual = self.compute(config)?;
        let passed = json_matches(&actual, &self.expected);
        debug!(fixture = %self.name, passed, "golden fixture checked");
        Ok(GoldenOutcome {
            name: self.name.clone(),
            passed,
            digest: digest(&actual),
            actual,
        })
    }
}

/// Load every `*.json` fixture in `dir`, sorted by file name.
pub fn load_cases(dir: &Path) -> Result<Vec<GoldenCase>, GoldenError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| GoldenError::Io { path, source }
    };

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path).map_err(io_err(path.as_path()))?;
            serde_json::from_str(&text).map_err(|source| GoldenError::Malformed {
                name: path.display().to_string(),
                source,
            })
        })
        .collect()
}

/// Stable BLAKE3 hex digest of an artifact's compact JSON.
pub fn digest(artifact: &Value) -> String {
    blake3::hash(artifact.to_string().as_bytes()).to_hex().to_string()
}

/// Structural JSON equality with numeric tolerance.
pub fn json_matches(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() <= NUMERIC_TOLERANCE,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_matches(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| json_matches(v, other)))
        }
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_match_floats() {
        assert!(json_matches(&json!({"pnl": 80.0}), &json!({"pnl": 80})));
        assert!(!json_matches(&json!({"pnl": 80.5}), &json!({"pnl": 80})));
    }

    #[test]
    fn key_order_is_ignored_but_keys_are_not() {
        assert!(json_matches(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
        assert!(!json_matches(&json!({"a": 1}), &json!({"a": 1, "b": null})));
    }

    #[test]
    fn digest_is_deterministic() {
        let v = json!({"adherence": 40, "timing": 30});
        assert_eq!(digest(&v), digest(&v.clone()));
        assert_ne!(digest(&v), digest(&json!({"adherence": 40})));
        assert_eq!(digest(&v).len(), 64);
    }

    #[test]
    fn computes_discipline_case() {
        let case = GoldenCase {
            name: "inline".into(),
            kind: GoldenKind::Discipline,
            input: json!({"planned": {"strike": 100}, "executed": {"strike": 105}}),
            expected: json!({"adherence": 25, "timing": 30, "risk": 30, "total": 85}),
        };
        let outcome = case.check(&AnalyticsConfig::default()).unwrap();
        assert!(outcome.passed, "actual: {}", outcome.actual);
    }

    #[test]
    fn malformed_input_is_reported() {
        let case = GoldenCase {
            name: "bad".into(),
            kind: GoldenKind::Batch,
            input: json!({"runs": 3}),
            expected: Value::Null,
        };
        let err = case.compute(&AnalyticsConfig::default()).unwrap_err();
        assert!(err.to_string().contains("bad"));
    }
}
