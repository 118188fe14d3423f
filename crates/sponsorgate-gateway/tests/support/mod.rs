//! Shared fixtures: seeded store, scripted relay, recording ledger sync.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::value::RawValue;
use serde_json::json;
use uuid::Uuid;

use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::model::{
    AdmissionRecord, ExecutionReceipt, NewRecord, QuotaSnapshot, RecordId, SpendingPolicy,
    SponsorshipStatus, User, WalletAccount,
};
use sponsorgate_core::protocol::SponsorRequest;
use sponsorgate_gateway::admission::{Collaborators, SponsorshipGateway};
use sponsorgate_gateway::clock::ManualClock;
use sponsorgate_gateway::config::{SponsorshipSection, SyncSection};
use sponsorgate_gateway::obs::SponsorMetrics;
use sponsorgate_gateway::relay::{ExecutionRelay, RelayError};
use sponsorgate_gateway::store::{
    LedgerStore, MemoryStore, QuotaCommit, Settlement, WalletSpend,
};
use sponsorgate_gateway::sync::{spawn_sync_worker, LedgerSync};

#[derive(Debug, Clone, Copy)]
pub enum RelayMode {
    /// Report the estimate as actual cost.
    Echo,
    /// Report a fixed actual cost.
    Cost(u64),
    Fail,
    /// Never answer within any sane timeout.
    Hang,
}

pub struct ScriptedRelay {
    mode: Mutex<RelayMode>,
    delay: Duration,
    pub calls: AtomicUsize,
    /// Operation names received, in call order.
    pub operations: Mutex<Vec<String>>,
}

impl ScriptedRelay {
    pub fn new(mode: RelayMode) -> Self {
        Self::with_delay(mode, Duration::ZERO)
    }

    pub fn with_delay(mode: RelayMode, delay: Duration) -> Self {
        Self {
            mode: Mutex::new(mode),
            delay,
            calls: AtomicUsize::new(0),
            operations: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: RelayMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionRelay for ScriptedRelay {
    async fn execute(
        &self,
        _target: &str,
        operation: &str,
        _payload: &RawValue,
        estimated_cost: u64,
    ) -> std::result::Result<ExecutionReceipt, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.operations.lock().unwrap().push(operation.to_string());
        let mode = *self.mode.lock().unwrap();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let actual_cost = match mode {
            RelayMode::Echo => estimated_cost,
            RelayMode::Cost(c) => c,
            RelayMode::Fail => return Err(RelayError::Rejected("reverted: nonce too low".into())),
            RelayMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                estimated_cost
            }
        };
        Ok(ExecutionReceipt {
            execution_hash: format!("0xexec{}", Uuid::new_v4().simple()),
            operation_hash: format!("0xop{}", Uuid::new_v4().simple()),
            actual_cost,
        })
    }
}

/// Records delivered ids; fails the first `fail_first` calls.
#[derive(Default)]
pub struct RecordingSync {
    pub delivered: Mutex<Vec<RecordId>>,
    pub attempts: AtomicU32,
    fail_first: AtomicU32,
    always_fail: bool,
}

impl RecordingSync {
    pub fn failing_first(n: u32) -> Self {
        Self {
            fail_first: AtomicU32::new(n),
            ..Default::default()
        }
    }

    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Default::default()
        }
    }

    pub fn delivered(&self) -> Vec<RecordId> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerSync for RecordingSync {
    async fn sync_record(&self, id: RecordId) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(SponsorError::Internal("ledger unreachable".into()));
        }
        let left = self.fail_first.load(Ordering::SeqCst);
        if left > 0 {
            self.fail_first.store(left - 1, Ordering::SeqCst);
            return Err(SponsorError::Internal("ledger busy".into()));
        }
        self.delivered.lock().unwrap().push(id);
        Ok(())
    }
}

/// Which settlement writes the ledger refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutage {
    Success,
    SuccessAndFailure,
}

/// `MemoryStore` whose settlement writes fail.
pub struct FlakyLedger {
    inner: Arc<MemoryStore>,
    outage: SettlementOutage,
}

fn outage() -> SponsorError {
    SponsorError::Internal("ledger write timed out".into())
}

#[async_trait]
impl LedgerStore for FlakyLedger {
    async fn quota(&self, address: &str) -> Result<Option<QuotaSnapshot>> {
        self.inner.quota(address).await
    }

    async fn reset_window(&self, address: &str, now: DateTime<Utc>) -> Result<QuotaSnapshot> {
        self.inner.reset_window(address, now).await
    }

    async fn create_pending(&self, new: NewRecord, now: DateTime<Utc>) -> Result<AdmissionRecord> {
        self.inner.create_pending(new, now).await
    }

    async fn settle_success(
        &self,
        _id: RecordId,
        _receipt: &ExecutionReceipt,
        _commit: &QuotaCommit,
        _now: DateTime<Utc>,
    ) -> Result<Settlement> {
        Err(outage())
    }

    async fn settle_failure(
        &self,
        id: RecordId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<AdmissionRecord> {
        match self.outage {
            SettlementOutage::Success => self.inner.settle_failure(id, reason, now).await,
            SettlementOutage::SuccessAndFailure => Err(outage()),
        }
    }

    async fn live_spend_total(&self, window_start: DateTime<Utc>) -> Result<u64> {
        self.inner.live_spend_total(window_start).await
    }

    async fn wallet_spends(&self, window_start: DateTime<Utc>) -> Result<Vec<WalletSpend>> {
        self.inner.wallet_spends(window_start).await
    }

    async fn sponsored_count(&self, since: DateTime<Utc>) -> Result<u64> {
        self.inner.sponsored_count(since).await
    }

    async fn record(&self, id: RecordId) -> Result<Option<AdmissionRecord>> {
        self.inner.record(id).await
    }

    async fn records_for_wallet(&self, address: &str) -> Result<Vec<AdmissionRecord>> {
        self.inner.records_for_wallet(address).await
    }

    async fn mark_synced(&self, id: RecordId, now: DateTime<Utc>) -> Result<bool> {
        self.inner.mark_synced(id, now).await
    }

    async fn unsynced_records(&self, limit: usize) -> Result<Vec<RecordId>> {
        self.inner.unsynced_records(limit).await
    }

    async fn stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RecordId>> {
        self.inner.stale_pending(created_before, limit).await
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub relay: Arc<ScriptedRelay>,
    pub sync: Arc<RecordingSync>,
    pub metrics: Arc<SponsorMetrics>,
    pub gateway: Arc<SponsorshipGateway>,
}

pub fn fast_sync() -> SyncSection {
    SyncSection {
        queue_capacity: 1024,
        max_attempts: 5,
        base_backoff_ms: 5,
        sweep_interval_ms: 100,
        stale_pending_ms: 1_000,
    }
}

pub struct HarnessBuilder {
    pub sponsorship: SponsorshipSection,
    pub sync_cfg: SyncSection,
    pub relay: ScriptedRelay,
    pub sync: RecordingSync,
    pub execution_timeout: Duration,
    pub outage: Option<SettlementOutage>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            sponsorship: SponsorshipSection::default(),
            sync_cfg: fast_sync(),
            relay: ScriptedRelay::new(RelayMode::Echo),
            sync: RecordingSync::default(),
            execution_timeout: Duration::from_secs(5),
            outage: None,
        }
    }
}

impl HarnessBuilder {
    pub fn relay(mut self, relay: ScriptedRelay) -> Self {
        self.relay = relay;
        self
    }

    pub fn sync(mut self, sync: RecordingSync) -> Self {
        self.sync = sync;
        self
    }

    pub fn execution_timeout(mut self, t: Duration) -> Self {
        self.execution_timeout = t;
        self
    }

    pub fn settlement_outage(mut self, outage: SettlementOutage) -> Self {
        self.outage = Some(outage);
        self
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let relay = Arc::new(self.relay);
        let sync = Arc::new(self.sync);
        let metrics = Arc::new(SponsorMetrics::default());
        let ledger: Arc<dyn LedgerStore> = match self.outage {
            Some(outage) => Arc::new(FlakyLedger {
                inner: store.clone(),
                outage,
            }),
            None => store.clone(),
        };

        let (queue, _worker) = spawn_sync_worker(
            sync.clone(),
            ledger.clone(),
            &self.sync_cfg,
            clock.clone(),
            metrics.clone(),
        )
        .unwrap();

        let gateway = SponsorshipGateway::new(
            &self.sponsorship,
            self.execution_timeout,
            Collaborators {
                directory: store.clone(),
                policies: store.clone(),
                ledger,
                relay: relay.clone(),
            },
            queue,
            clock.clone(),
            metrics.clone(),
        )
        .unwrap();

        Harness {
            store,
            clock,
            relay,
            sync,
            metrics,
            gateway: Arc::new(gateway),
        }
    }
}

impl Harness {
    pub fn now(&self) -> DateTime<Utc> {
        use sponsorgate_gateway::clock::Clock;
        self.clock.now()
    }

    pub fn add_policy(
        &self,
        name: &str,
        role: Option<&str>,
        tier: Option<&str>,
        limit: u64,
        active: bool,
    ) {
        self.store.insert_policy(SpendingPolicy {
            id: Uuid::new_v4(),
            name: name.into(),
            role: role.map(Into::into),
            tier: tier.map(Into::into),
            daily_limit: limit,
            active,
        });
    }

    /// Wallet owned by a fresh user with the given role/tier.
    pub fn add_wallet(
        &self,
        address: &str,
        role: Option<&str>,
        tier: Option<&str>,
        spend: u64,
        last_reset: DateTime<Utc>,
    ) {
        let user_id = format!("user-{address}");
        self.store.insert_user(User {
            id: user_id.clone(),
            role: role.map(Into::into),
            tier: tier.map(Into::into),
        });
        self.store
            .insert_wallet(WalletAccount {
                address: address.into(),
                user_id,
                status: SponsorshipStatus::Active,
                daily_spend: spend,
                last_reset,
            })
            .unwrap();
    }

    pub fn spend(&self, address: &str) -> u64 {
        self.store.wallet(address).unwrap().unwrap().daily_spend
    }

    pub async fn records(&self, address: &str) -> Vec<AdmissionRecord> {
        self.store.records_for_wallet(address).await.unwrap()
    }
}

pub fn request(address: &str, operation: &str, cost: Option<u64>) -> SponsorRequest {
    let mut body = json!({
        "walletAddress": address,
        "target": "0xOrderBook",
        "operation": operation,
        "category": "orders",
        "payload": { "orderId": "ord_42" },
    });
    if let Some(c) = cost {
        body["estimatedCost"] = json!(c);
    }
    serde_json::from_str(&body.to_string()).unwrap()
}

/// Poll `f` until it returns true or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(f: F) -> bool {
    for _ in 0..200 {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    f()
}
