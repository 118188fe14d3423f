//! Outbound sponsorship bodies.

use serde::{Deserialize, Serialize};

use crate::error::SponsorError;
use crate::model::RecordId;

/// Body returned when the operation was sponsored and executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorAccepted {
    pub success: bool,
    pub execution_hash: String,
    pub operation_hash: String,
    pub sponsored: bool,
    /// Policy limit minus updated spend.
    pub remaining_quota: u64,
    pub record_id: RecordId,
}

/// Body returned for any rejection or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorRejected {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_spend: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
}

impl SponsorRejected {
    pub fn from_error(err: &SponsorError, record_id: Option<RecordId>) -> Self {
        let (limit, current_spend) = match err {
            SponsorError::QuotaExceeded {
                limit,
                current_spend,
                ..
            } => (Some(*limit), Some(*current_spend)),
            _ => (None, None),
        };
        Self {
            success: false,
            error: err.public_message(),
            code: err.code().as_str().to_string(),
            limit,
            current_spend,
            record_id,
        }
    }
}
