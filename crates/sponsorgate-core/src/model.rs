//! Domain model: wallets, users, spending policies, admission records.
//!
//! Amounts are integers in the smallest currency unit used by policies
//! (USD with six decimals, so `1_000_000` is one dollar).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, SponsorError};

/// Admission record identifier.
pub type RecordId = Uuid;

/// Whether a wallet may currently be sponsored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SponsorshipStatus {
    Active,
    Suspended,
}

impl SponsorshipStatus {
    pub fn is_active(self) -> bool {
        matches!(self, SponsorshipStatus::Active)
    }
}

/// Account owner. Only `role` and `tier` take part in policy matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

/// A sponsoring-eligible account and its quota window state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: String,
    pub user_id: String,
    pub status: SponsorshipStatus,
    /// Spend accumulated in the current window.
    pub daily_spend: u64,
    /// Start of the current rolling window.
    pub last_reset: DateTime<Utc>,
}

/// Directory view of a wallet joined with its owner's matching attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletOwner {
    pub address: String,
    pub user_id: String,
    pub status: SponsorshipStatus,
    pub role: Option<String>,
    pub tier: Option<String>,
}

/// Quota window snapshot for one wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub daily_spend: u64,
    pub last_reset: DateTime<Utc>,
}

/// A named rule bounding daily sponsorship spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingPolicy {
    pub id: Uuid,
    pub name: String,
    pub role: Option<String>,
    pub tier: Option<String>,
    pub daily_limit: u64,
    pub active: bool,
}

/// Field values used when an upsert has to create the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDefaults {
    pub role: Option<String>,
    pub tier: Option<String>,
    pub daily_limit: u64,
    pub active: bool,
}

impl SpendingPolicy {
    pub fn from_defaults(name: impl Into<String>, defaults: PolicyDefaults) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role: defaults.role,
            tier: defaults.tier,
            daily_limit: defaults.daily_limit,
            active: defaults.active,
        }
    }

    /// Exact filter match: `None` only matches a policy without that filter.
    pub fn matches_filters(&self, role: Option<&str>, tier: Option<&str>) -> bool {
        self.role.as_deref() == role && self.tier.as_deref() == tier
    }
}

/// Lifecycle of an admission record. Transitions only leave `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Pending,
    Success,
    Failed,
}

/// What the execution collaborator returns for a sponsored operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub execution_hash: String,
    pub operation_hash: String,
    pub actual_cost: u64,
}

/// Input for creating a pending admission record.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub wallet_address: String,
    pub policy_id: Uuid,
    pub policy_name: String,
    pub target: String,
    pub operation: String,
    pub category: String,
    pub batch_id: Option<String>,
    pub estimated_cost: u64,
    pub metadata: Value,
}

/// Audit trail entry for one sponsorship attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRecord {
    pub id: RecordId,
    pub wallet_address: String,
    pub policy_id: Uuid,
    pub policy_name: String,
    pub target: String,
    pub operation: String,
    pub category: String,
    pub batch_id: Option<String>,
    pub status: RecordStatus,
    pub sponsored: bool,
    pub estimated_cost: u64,
    /// Cost charged to the platform (zero unless SUCCESS).
    pub gas_cost: u64,
    pub execution_hash: Option<String>,
    pub operation_hash: Option<String>,
    pub failure: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl AdmissionRecord {
    pub fn pending(new: NewRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address: new.wallet_address,
            policy_id: new.policy_id,
            policy_name: new.policy_name,
            target: new.target,
            operation: new.operation,
            category: new.category,
            batch_id: new.batch_id,
            status: RecordStatus::Pending,
            sponsored: false,
            estimated_cost: new.estimated_cost,
            gas_cost: 0,
            execution_hash: None,
            operation_hash: None,
            failure: None,
            metadata: new.metadata,
            created_at: now,
            completed_at: None,
            synced_at: None,
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self.status, RecordStatus::Pending)
    }

    /// PENDING -> SUCCESS.
    pub fn complete_success(
        &mut self,
        receipt: &ExecutionReceipt,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_pending()?;
        self.status = RecordStatus::Success;
        self.sponsored = true;
        self.gas_cost = receipt.actual_cost;
        self.execution_hash = Some(receipt.execution_hash.clone());
        self.operation_hash = Some(receipt.operation_hash.clone());
        self.completed_at = Some(now);
        Ok(())
    }

    /// PENDING -> FAILED.
    pub fn complete_failure(&mut self, reason: &str, now: DateTime<Utc>) -> Result<()> {
        self.ensure_pending()?;
        self.status = RecordStatus::Failed;
        self.failure = Some(reason.to_string());
        self.completed_at = Some(now);
        Ok(())
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.is_final() {
            return Err(SponsorError::Internal(format!(
                "admission record {} already finalized as {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}
