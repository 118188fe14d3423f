//! Execution relay collaborator.
//!
//! The relay submits the sponsored operation and reports its hashes and the
//! actual cost. It receives the operation name the gate admitted, so a relay
//! must execute that operation and nothing else addressed by `target`.
//! `DevRelay` fabricates receipts for local runs.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::value::RawValue;
use thiserror::Error;
use uuid::Uuid;

use sponsorgate_core::model::ExecutionReceipt;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay rejected operation: {0}")]
    Rejected(String),
    #[error("relay unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ExecutionRelay: Send + Sync {
    async fn execute(
        &self,
        target: &str,
        operation: &str,
        payload: &RawValue,
        estimated_cost: u64,
    ) -> std::result::Result<ExecutionReceipt, RelayError>;
}

/// Local relay: sleeps for `latency`, then returns random hashes.
pub struct DevRelay {
    simulated_cost: u64,
    latency: Duration,
}

impl DevRelay {
    /// `simulated_cost == 0` reports the estimate as the actual cost.
    pub fn new(simulated_cost: u64, latency: Duration) -> Self {
        Self {
            simulated_cost,
            latency,
        }
    }
}

fn fake_hash() -> String {
    format!("0x{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[async_trait]
impl ExecutionRelay for DevRelay {
    async fn execute(
        &self,
        target: &str,
        operation: &str,
        payload: &RawValue,
        estimated_cost: u64,
    ) -> std::result::Result<ExecutionReceipt, RelayError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        tracing::debug!(
            %target,
            %operation,
            payload_len = payload.get().len(),
            "dev relay executing"
        );
        let actual_cost = if self.simulated_cost == 0 {
            estimated_cost
        } else {
            self.simulated_cost
        };
        Ok(ExecutionReceipt {
            execution_hash: fake_hash(),
            operation_hash: fake_hash(),
            actual_cost,
        })
    }
}
