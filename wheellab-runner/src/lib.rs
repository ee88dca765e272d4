//! WheelLab Runner: strategy analytics over journal and backtest records.
//!
//! Three pure, stateless stages, none of which calls another:
//! - Discipline scoring of one executed trade against its plan
//! - Strategy health snapshot over a strategy's closed cycles
//! - Batch comparison over the runs of a finished parameter sweep
//!
//! Plus the pieces around them:
//! - Small-account position guardrails
//! - TOML-loadable thresholds
//! - Golden-fixture conformance checks
//! - JSON/CSV export
//! - Blocking client for the remote backtest engine

pub mod batch;
pub mod config;
pub mod discipline;
pub mod engine_client;
pub mod enforcement;
pub mod export;
pub mod golden;
pub mod health;

pub use batch::{
    compute_batch_summary, composite_score, finalize_batch, BatchReadiness, BatchSummary,
};
pub use config::{AnalyticsConfig, ConfigError, DisciplineConfig, HealthConfig};
pub use discipline::{score, DisciplineBreakdown, DisciplineScorer};
pub use engine_client::{EngineClient, EngineError};
pub use enforcement::{enforce_position, EnforcementDecision, RejectionReason};
pub use export::{export_batch_csv, export_cycle_summaries_csv, export_json};
pub use golden::{GoldenCase, GoldenError, GoldenKind, GoldenOutcome};
pub use health::{
    compute_snapshot, CycleSummary, HealthAggregator, HealthSnapshot, RegimePerformance,
    WeaknessFlag,
};
