//! Inbound sponsorship request.

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{Result, SponsorError};

/// Request to sponsor one operation on behalf of a wallet.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SponsorRequest {
    pub wallet_address: String,
    /// Target contract / operation identifier handed to the relay.
    pub target: String,
    /// Operation name checked by the operation gate.
    pub operation: String,
    /// Operation category label (e.g. "orders", "inventory").
    #[serde(default = "default_category")]
    pub category: String,
    /// Operation payload, forwarded verbatim.
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Prospective charge; the configured default applies when absent.
    #[serde(default)]
    pub estimated_cost: Option<u64>,
}

fn default_category() -> String {
    "general".into()
}

impl SponsorRequest {
    /// Trim the identifier fields the gate and the directory match on.
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.wallet_address);
        trim_in_place(&mut self.target);
        trim_in_place(&mut self.operation);
        trim_in_place(&mut self.category);
    }

    /// Structural validation (400 on failure). Returns the payload to forward.
    pub fn validate(&self) -> Result<&RawValue> {
        if self.wallet_address.trim().is_empty() {
            return Err(SponsorError::BadRequest("walletAddress must not be empty".into()));
        }
        if self.target.trim().is_empty() {
            return Err(SponsorError::BadRequest("target must not be empty".into()));
        }
        if self.operation.trim().is_empty() {
            return Err(SponsorError::BadRequest("operation must not be empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(SponsorError::BadRequest("category must not be empty".into()));
        }
        if let Some(meta) = &self.metadata {
            if !meta.is_object() {
                return Err(SponsorError::BadRequest("metadata must be a JSON object".into()));
            }
        }
        if let Some(batch) = &self.batch_id {
            if batch.trim().is_empty() {
                return Err(SponsorError::BadRequest("batchId must not be blank".into()));
            }
        }
        self.payload
            .as_deref()
            .ok_or_else(|| SponsorError::BadRequest("payload is required".into()))
    }
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}
