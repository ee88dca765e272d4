//! Domain records for the wheel journal.

pub mod cycle;
pub mod ids;
pub mod position;
pub mod run;
pub mod trade_plan;

pub use cycle::{Cycle, Regime, UNKNOWN_REGIME};
pub use ids::{BatchId, CycleId, RunId, StrategyId};
pub use position::{PositionRequest, SmallAccountSettings};
pub use run::{Batch, RegimeResult, Run, RunMetrics, RunStatus};
pub use trade_plan::{ExecutedParams, PlannedParams};
