//! WheelLab Core: domain records for an options-wheel trading journal.
//!
//! This crate holds data, not policy:
//! - Trade plans vs. executions, completed wheel cycles, backtest runs and batches
//! - Date-like value normalization shared by every timestamp comparison
//! - Lenient field decoding (malformed fields read as absent)
//! - Insertion-ordered keyed tables
//! - Wire types of the remote backtest engine

pub mod domain;
pub mod engine;
pub mod instant;
pub mod lenient;
pub mod ordered;

pub use instant::{DateLike, TimestampParts, UnparseableInstant};
