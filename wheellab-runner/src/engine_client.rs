//! Blocking client for the remote backtest engine.
//!
//! One request, one response: `POST {base}/run-backtest` with `{configUsed}`,
//! answered by `{backtestResult}`. No retries; callers decide what a failure
//! means for their job.

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use wheellab_core::engine::{BacktestResult, EngineRequest, EngineResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("engine unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("engine response did not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct EngineClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/run-backtest", self.base_url.trim_end_matches('/'))
    }

    /// Run one backtest remotely.
    pub fn run_backtest(&self, config: Map<String, Value>) -> Result<BacktestResult, EngineError> {
        let url = self.endpoint();
        debug!(%url, "submitting backtest");
        let resp = self
            .client
            .post(&url)
            .json(&EngineRequest {
                config_used: config,
            })
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "backtest engine rejected request");
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }
        decode_response(&body)
    }
}

/// Parse a `run-backtest` response body.
pub fn decode_response(body: &str) -> Result<BacktestResult, EngineError> {
    let envelope: EngineResponse = serde_json::from_str(body)?;
    Ok(envelope.backtest_result)
}
