//! In-memory store backing every storage seam.
//!
//! - Policies live in a `DashMap` keyed by name; `upsert_policy` goes through
//!   the entry API so concurrent creators of the same name see one row.
//! - Wallets and admission records share one mutex so a settlement updates
//!   both or neither. The lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::model::{
    AdmissionRecord, ExecutionReceipt, NewRecord, PolicyDefaults, QuotaSnapshot, RecordId,
    RecordStatus, SpendingPolicy, SponsorshipStatus, User, WalletAccount, WalletOwner,
};

use super::{LedgerStore, PolicyStore, QuotaCommit, Settlement, WalletDirectory, WalletSpend};

#[derive(Default)]
struct LedgerTables {
    wallets: HashMap<String, WalletAccount>,
    records: HashMap<RecordId, AdmissionRecord>,
    /// Creation order, for oldest-first scans.
    order: Vec<RecordId>,
}

#[derive(Default)]
pub struct MemoryStore {
    policies: DashMap<String, SpendingPolicy>,
    users: DashMap<String, User>,
    tables: Mutex<LedgerTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_policy(&self, policy: SpendingPolicy) {
        self.policies.insert(policy.name.clone(), policy);
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_wallet(&self, wallet: WalletAccount) -> Result<()> {
        self.lock()?.wallets.insert(wallet.address.clone(), wallet);
        Ok(())
    }

    pub fn wallet(&self, address: &str) -> Result<Option<WalletAccount>> {
        Ok(self.lock()?.wallets.get(address).cloned())
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.lock()?.records.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerTables>> {
        self.tables
            .lock()
            .map_err(|_| SponsorError::Internal("ledger tables lock poisoned".into()))
    }
}

fn missing_wallet(address: &str) -> SponsorError {
    SponsorError::WalletNotFound(address.to_string())
}

fn missing_record(id: RecordId) -> SponsorError {
    SponsorError::Internal(format!("admission record {id} not found"))
}

#[async_trait]
impl WalletDirectory for MemoryStore {
    async fn lookup_wallet(&self, address: &str) -> Result<Option<WalletOwner>> {
        let Some(wallet) = self.lock()?.wallets.get(address).cloned() else {
            return Ok(None);
        };
        let (role, tier) = self
            .users
            .get(&wallet.user_id)
            .map(|u| (u.role.clone(), u.tier.clone()))
            .unwrap_or_default();

        Ok(Some(WalletOwner {
            address: wallet.address,
            user_id: wallet.user_id,
            status: wallet.status,
            role,
            tier,
        }))
    }

    async fn set_sponsorship_status(&self, address: &str, status: SponsorshipStatus) -> Result<()> {
        let mut t = self.lock()?;
        let wallet = t.wallets.get_mut(address).ok_or_else(|| missing_wallet(address))?;
        wallet.status = status;
        Ok(())
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn find_policy(
        &self,
        role: Option<&str>,
        tier: Option<&str>,
    ) -> Result<Option<SpendingPolicy>> {
        // Names are unique; pick the lexically first match so resolution is stable.
        Ok(self
            .policies
            .iter()
            .filter(|p| p.value().matches_filters(role, tier))
            .min_by(|a, b| a.key().cmp(b.key()))
            .map(|p| p.value().clone()))
    }

    async fn upsert_policy(&self, name: &str, defaults: PolicyDefaults) -> Result<SpendingPolicy> {
        let entry = self
            .policies
            .entry(name.to_string())
            .or_insert_with(|| SpendingPolicy::from_defaults(name, defaults));
        Ok(entry.value().clone())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn quota(&self, address: &str) -> Result<Option<QuotaSnapshot>> {
        Ok(self.lock()?.wallets.get(address).map(|w| QuotaSnapshot {
            daily_spend: w.daily_spend,
            last_reset: w.last_reset,
        }))
    }

    async fn reset_window(&self, address: &str, now: DateTime<Utc>) -> Result<QuotaSnapshot> {
        let mut t = self.lock()?;
        let wallet = t.wallets.get_mut(address).ok_or_else(|| missing_wallet(address))?;
        wallet.daily_spend = 0;
        wallet.last_reset = now;
        Ok(QuotaSnapshot {
            daily_spend: 0,
            last_reset: now,
        })
    }

    async fn create_pending(&self, new: NewRecord, now: DateTime<Utc>) -> Result<AdmissionRecord> {
        let record = AdmissionRecord::pending(new, now);
        let mut t = self.lock()?;
        t.order.push(record.id);
        t.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn settle_success(
        &self,
        id: RecordId,
        receipt: &ExecutionReceipt,
        commit: &QuotaCommit,
        now: DateTime<Utc>,
    ) -> Result<Settlement> {
        let mut guard = self.lock()?;
        let t = &mut *guard;

        let record = t.records.get_mut(&id).ok_or_else(|| missing_record(id))?;
        if record.wallet_address != commit.wallet_address {
            return Err(SponsorError::Internal(format!(
                "admission record {id} belongs to {}, not {}",
                record.wallet_address, commit.wallet_address
            )));
        }
        let wallet = t
            .wallets
            .get_mut(&commit.wallet_address)
            .ok_or_else(|| missing_wallet(&commit.wallet_address))?;

        // Both rows are located; from here the two updates land together.
        record.complete_success(receipt, now)?;

        let uncapped = wallet.daily_spend.saturating_add(receipt.actual_cost);
        let daily_spend = uncapped.min(commit.daily_limit.max(wallet.daily_spend));
        let overshoot = uncapped - daily_spend;
        wallet.daily_spend = daily_spend;

        Ok(Settlement {
            record: record.clone(),
            daily_spend,
            overshoot,
        })
    }

    async fn settle_failure(
        &self,
        id: RecordId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<AdmissionRecord> {
        let mut t = self.lock()?;
        let record = t.records.get_mut(&id).ok_or_else(|| missing_record(id))?;
        record.complete_failure(reason, now)?;
        Ok(record.clone())
    }

    async fn live_spend_total(&self, window_start: DateTime<Utc>) -> Result<u64> {
        Ok(self
            .lock()?
            .wallets
            .values()
            .filter(|w| w.last_reset > window_start)
            .fold(0u64, |acc, w| acc.saturating_add(w.daily_spend)))
    }

    async fn wallet_spends(&self, window_start: DateTime<Utc>) -> Result<Vec<WalletSpend>> {
        Ok(self
            .lock()?
            .wallets
            .values()
            .filter(|w| w.last_reset > window_start && w.daily_spend > 0)
            .map(|w| WalletSpend {
                address: w.address.clone(),
                user_id: w.user_id.clone(),
                daily_spend: w.daily_spend,
            })
            .collect())
    }

    async fn sponsored_count(&self, since: DateTime<Utc>) -> Result<u64> {
        Ok(self
            .lock()?
            .records
            .values()
            .filter(|r| r.status == RecordStatus::Success)
            .filter(|r| r.completed_at.is_some_and(|t| t > since))
            .count() as u64)
    }

    async fn record(&self, id: RecordId) -> Result<Option<AdmissionRecord>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    async fn records_for_wallet(&self, address: &str) -> Result<Vec<AdmissionRecord>> {
        let t = self.lock()?;
        Ok(t.order
            .iter()
            .filter_map(|id| t.records.get(id))
            .filter(|r| r.wallet_address == address)
            .cloned()
            .collect())
    }

    async fn mark_synced(&self, id: RecordId, now: DateTime<Utc>) -> Result<bool> {
        let mut t = self.lock()?;
        let record = t.records.get_mut(&id).ok_or_else(|| missing_record(id))?;
        if record.synced_at.is_some() {
            return Ok(false);
        }
        record.synced_at = Some(now);
        Ok(true)
    }

    async fn unsynced_records(&self, limit: usize) -> Result<Vec<RecordId>> {
        let t = self.lock()?;
        Ok(t.order
            .iter()
            .filter_map(|id| t.records.get(id))
            .filter(|r| r.is_final() && r.synced_at.is_none())
            .map(|r| r.id)
            .take(limit)
            .collect())
    }

    async fn stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RecordId>> {
        let t = self.lock()?;
        Ok(t.order
            .iter()
            .filter_map(|id| t.records.get(id))
            .filter(|r| r.status == RecordStatus::Pending && r.created_at < created_before)
            .map(|r| r.id)
            .take(limit)
            .collect())
    }
}
