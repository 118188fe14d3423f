//! Storage collaborators.
//!
//! The gateway only talks to these traits. `MemoryStore` implements all of
//! them for dev deployments and tests; a relational backend would implement
//! the same seams with a name-unique policy table, a conditional spend update,
//! and one transaction per settlement.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sponsorgate_core::error::Result;
use sponsorgate_core::model::{
    AdmissionRecord, ExecutionReceipt, NewRecord, PolicyDefaults, QuotaSnapshot, RecordId,
    SpendingPolicy, SponsorshipStatus, WalletOwner,
};

pub use memory::MemoryStore;

/// Identity / wallet directory.
#[async_trait]
pub trait WalletDirectory: Send + Sync {
    async fn lookup_wallet(&self, address: &str) -> Result<Option<WalletOwner>>;

    /// Governance toggle. `WalletNotFound` when the address is unknown.
    async fn set_sponsorship_status(&self, address: &str, status: SponsorshipStatus) -> Result<()>;
}

/// Read-mostly policy table.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Exact filter match; inactive policies are returned too.
    async fn find_policy(
        &self,
        role: Option<&str>,
        tier: Option<&str>,
    ) -> Result<Option<SpendingPolicy>>;

    /// Return the policy named `name`, creating it from `defaults` if absent.
    /// Concurrent callers observe the same row.
    async fn upsert_policy(&self, name: &str, defaults: PolicyDefaults) -> Result<SpendingPolicy>;
}

/// Spend increment to apply together with a SUCCESS finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaCommit {
    pub wallet_address: String,
    pub daily_limit: u64,
}

/// Result of an atomic success settlement.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub record: AdmissionRecord,
    /// Wallet spend after the increment.
    pub daily_spend: u64,
    /// Cost beyond the limit that was not committed.
    pub overshoot: u64,
}

/// One wallet's spend within the live window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSpend {
    pub address: String,
    pub user_id: String,
    pub daily_spend: u64,
}

/// Mutable shared state: quota counters and admission records.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn quota(&self, address: &str) -> Result<Option<QuotaSnapshot>>;

    /// Zero the accumulator and start a new window at `now`.
    async fn reset_window(&self, address: &str, now: DateTime<Utc>) -> Result<QuotaSnapshot>;

    async fn create_pending(&self, new: NewRecord, now: DateTime<Utc>) -> Result<AdmissionRecord>;

    /// PENDING -> SUCCESS and spend increment, applied together.
    /// Committed spend is clamped to `commit.daily_limit`.
    async fn settle_success(
        &self,
        id: RecordId,
        receipt: &ExecutionReceipt,
        commit: &QuotaCommit,
        now: DateTime<Utc>,
    ) -> Result<Settlement>;

    /// PENDING -> FAILED; spend untouched.
    async fn settle_failure(
        &self,
        id: RecordId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<AdmissionRecord>;

    /// Sum of spend over wallets whose window started after `window_start`.
    async fn live_spend_total(&self, window_start: DateTime<Utc>) -> Result<u64>;

    /// Wallets with non-zero spend in a live window.
    async fn wallet_spends(&self, window_start: DateTime<Utc>) -> Result<Vec<WalletSpend>>;

    /// SUCCESS records completed after `since`.
    async fn sponsored_count(&self, since: DateTime<Utc>) -> Result<u64>;

    async fn record(&self, id: RecordId) -> Result<Option<AdmissionRecord>>;

    async fn records_for_wallet(&self, address: &str) -> Result<Vec<AdmissionRecord>>;

    /// Returns `false` when the record was already synced.
    async fn mark_synced(&self, id: RecordId, now: DateTime<Utc>) -> Result<bool>;

    /// Finalized records not yet synced, oldest first.
    async fn unsynced_records(&self, limit: usize) -> Result<Vec<RecordId>>;

    /// PENDING records created before `created_before`, oldest first.
    async fn stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RecordId>>;
}
