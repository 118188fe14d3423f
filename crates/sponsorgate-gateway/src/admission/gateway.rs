//! Sponsorship gateway.
//!
//! Pipeline for one request (each step short-circuits with its own code):
//! gate -> wallet lookup -> policy -> quota -> platform cap -> PENDING record
//! -> relay (bounded by a timeout) -> settlement -> ledger sync enqueue.
//!
//! The wallet permit is held from the quota check through settlement, so two
//! admissions for one wallet never both pass the check against the same
//! spend value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde_json::Value;
use tracing::Instrument;

use sponsorgate_core::error::{RejectCode, Result, SponsorError};
use sponsorgate_core::model::{
    AdmissionRecord, ExecutionReceipt, NewRecord, RecordId, SponsorshipStatus, WalletOwner,
};
use sponsorgate_core::protocol::{GasStats, SponsorRequest, TopSpender};

use super::stage::Stage;
use crate::audit::TransactionAuditor;
use crate::clock::Clock;
use crate::config::SponsorshipSection;
use crate::obs::SponsorMetrics;
use crate::policy::{OperationGate, PolicyResolver};
use crate::quota::{cap, ledger, PlatformCapGuard, QuotaLedger};
use crate::relay::ExecutionRelay;
use crate::store::{LedgerStore, PolicyStore, WalletDirectory};
use crate::sync::SyncQueue;

/// External collaborators the gateway is composed from.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn WalletDirectory>,
    pub policies: Arc<dyn PolicyStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub relay: Arc<dyn ExecutionRelay>,
}

/// Accepted and executed.
#[derive(Debug, Clone)]
pub struct Sponsored {
    pub record: AdmissionRecord,
    pub receipt: ExecutionReceipt,
    pub remaining_quota: u64,
}

/// Terminal REJECTED state.
#[derive(Debug)]
pub struct Rejection {
    pub error: SponsorError,
    /// Last stage completed before the failure.
    pub reached: Stage,
    /// Set once an admission record exists.
    pub record_id: Option<RecordId>,
}

impl Rejection {
    fn at(reached: Stage, error: SponsorError) -> Self {
        Self {
            error,
            reached,
            record_id: None,
        }
    }

    pub fn code(&self) -> RejectCode {
        self.error.code()
    }
}

/// Flattened result of `request_sponsorship`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorshipOutcome {
    pub accepted: bool,
    pub execution_hash: Option<String>,
    pub operation_hash: Option<String>,
    pub remaining_quota: Option<u64>,
    pub error_code: Option<RejectCode>,
    pub record_id: Option<RecordId>,
}

impl From<std::result::Result<Sponsored, Rejection>> for SponsorshipOutcome {
    fn from(res: std::result::Result<Sponsored, Rejection>) -> Self {
        match res {
            Ok(s) => Self {
                accepted: true,
                execution_hash: Some(s.receipt.execution_hash),
                operation_hash: Some(s.receipt.operation_hash),
                remaining_quota: Some(s.remaining_quota),
                error_code: None,
                record_id: Some(s.record.id),
            },
            Err(r) => Self {
                accepted: false,
                execution_hash: None,
                operation_hash: None,
                remaining_quota: None,
                error_code: Some(r.code()),
                record_id: r.record_id,
            },
        }
    }
}

pub struct SponsorshipGateway {
    gate: OperationGate,
    directory: Arc<dyn WalletDirectory>,
    ledger_store: Arc<dyn LedgerStore>,
    resolver: PolicyResolver,
    quota: QuotaLedger,
    cap: PlatformCapGuard,
    auditor: TransactionAuditor,
    relay: Arc<dyn ExecutionRelay>,
    sync: SyncQueue,
    clock: Arc<dyn Clock>,
    metrics: Arc<SponsorMetrics>,
    execution_timeout: Duration,
    default_charge: u64,
    top_spenders: usize,
}

impl SponsorshipGateway {
    pub fn new(
        cfg: &SponsorshipSection,
        execution_timeout: Duration,
        deps: Collaborators,
        sync: SyncQueue,
        clock: Arc<dyn Clock>,
        metrics: Arc<SponsorMetrics>,
    ) -> Result<Self> {
        let window_secs = i64::try_from(cfg.window_secs)
            .map_err(|_| SponsorError::BadRequest("sponsorship.window_secs out of range".into()))?;
        let window = chrono::Duration::seconds(window_secs);

        Ok(Self {
            gate: OperationGate::new(&cfg.restricted_operations, &cfg.allowed_operations)?,
            directory: deps.directory,
            ledger_store: Arc::clone(&deps.ledger),
            resolver: PolicyResolver::new(
                deps.policies,
                cfg.fallback_policy.name.clone(),
                cfg.fallback_policy.daily_limit,
            ),
            quota: QuotaLedger::new(Arc::clone(&deps.ledger), window),
            cap: PlatformCapGuard::new(
                Arc::clone(&deps.ledger),
                cfg.platform_daily_cap,
                cfg.cap_warn_pct,
                window,
            ),
            auditor: TransactionAuditor::new(deps.ledger, Arc::clone(&clock)),
            relay: deps.relay,
            sync,
            clock,
            metrics,
            execution_timeout,
            default_charge: cfg.default_charge,
            top_spenders: cfg.top_spenders,
        })
    }

    pub fn metrics(&self) -> &SponsorMetrics {
        &self.metrics
    }

    pub async fn request_sponsorship(&self, req: SponsorRequest) -> SponsorshipOutcome {
        self.admit(req).await.into()
    }

    /// Run one request through the pipeline.
    pub async fn admit(&self, req: SponsorRequest) -> std::result::Result<Sponsored, Rejection> {
        let span = tracing::info_span!(
            "sponsor",
            wallet = %req.wallet_address,
            operation = %req.operation,
            category = %req.category,
        );

        self.metrics.admissions_in_flight.inc(&[]);
        let res = self.run(req).instrument(span.clone()).await;
        self.metrics.admissions_in_flight.dec(&[]);

        let _enter = span.enter();
        match &res {
            Ok(s) => {
                self.metrics.decisions.inc(&[("code", "ACCEPTED")]);
                tracing::info!(
                    record_id = %s.record.id,
                    remaining = s.remaining_quota,
                    "sponsored"
                );
            }
            Err(r) => {
                self.metrics.decisions.inc(&[("code", r.code().as_str())]);
                if r.reached.has_record() {
                    tracing::warn!(
                        code = r.code().as_str(),
                        stage = r.reached.as_str(),
                        record_id = ?r.record_id,
                        error = %r.error,
                        "sponsorship failed after admission"
                    );
                } else {
                    tracing::info!(
                        code = r.code().as_str(),
                        stage = r.reached.as_str(),
                        error = %r.error,
                        "sponsorship rejected"
                    );
                }
            }
        }
        res
    }

    async fn run(&self, mut req: SponsorRequest) -> std::result::Result<Sponsored, Rejection> {
        req.normalize();
        let payload = req.validate().map_err(|e| Rejection::at(Stage::Received, e))?;
        let address = req.wallet_address.as_str();

        // Stateless, cheapest check first.
        self.gate
            .check(&req.category, &req.operation)
            .map_err(|e| Rejection::at(Stage::Received, e))?;

        let owner = self
            .validate_wallet(address)
            .await
            .map_err(|e| Rejection::at(Stage::GateChecked, e))?;

        let resolution = self
            .resolver
            .resolve(owner.role.as_deref(), owner.tier.as_deref())
            .await
            .map_err(|e| Rejection::at(Stage::WalletValidated, e))?;
        let policy = resolution.policy;

        let charge = req.estimated_cost.unwrap_or(self.default_charge);
        let permit = self.quota.lock_wallet(address).await;
        let now = self.clock.now();

        let check = self
            .quota
            .check(&permit, &policy, charge, now)
            .await
            .map_err(|e| Rejection::at(Stage::PolicyResolved, e))?;
        tracing::debug!(
            policy = %policy.name,
            matched = resolution.matched.as_str(),
            spend = check.current_spend,
            limit = check.limit,
            charge = check.charge,
            reset = check.was_reset,
            "quota admitted"
        );

        self.cap
            .check(now)
            .await
            .map_err(|e| Rejection::at(Stage::QuotaChecked, e))?;

        let record = self
            .auditor
            .open(NewRecord {
                wallet_address: address.to_string(),
                policy_id: policy.id,
                policy_name: policy.name.clone(),
                target: req.target.clone(),
                operation: req.operation.clone(),
                category: req.category.clone(),
                batch_id: req.batch_id.clone(),
                estimated_cost: charge,
                metadata: req
                    .metadata
                    .clone()
                    .unwrap_or_else(|| Value::Object(Default::default())),
            })
            .await
            .map_err(|e| Rejection::at(Stage::CapChecked, e))?;

        let started = Instant::now();
        let executed = tokio::time::timeout(
            self.execution_timeout,
            self.relay.execute(&req.target, &req.operation, payload, charge),
        )
        .await;

        let receipt = match executed {
            Ok(Ok(receipt)) => {
                self.metrics
                    .execution_duration
                    .observe(&[("outcome", "success")], started.elapsed());
                receipt
            }
            Ok(Err(e)) => {
                self.metrics
                    .execution_duration
                    .observe(&[("outcome", "error")], started.elapsed());
                let reason = e.to_string();
                let err = SponsorError::ExecutionFailed(reason.clone());
                return Err(self.fail_record(record.id, &reason, err).await);
            }
            Err(_) => {
                self.metrics
                    .execution_duration
                    .observe(&[("outcome", "timeout")], started.elapsed());
                let reason = format!(
                    "relay timed out after {}ms",
                    self.execution_timeout.as_millis()
                );
                let err = SponsorError::ExecutionFailed(reason.clone());
                return Err(self.fail_record(record.id, &reason, err).await);
            }
        };

        let commit = self.quota.commitment(&permit, &policy);
        let settlement = match self.auditor.finalize_success(record.id, &receipt, &commit).await {
            Ok(settlement) => settlement,
            Err(e) => {
                tracing::error!(
                    record_id = %record.id,
                    execution_hash = %receipt.execution_hash,
                    error = %e,
                    "settlement failed after execution"
                );
                let reason = format!(
                    "settlement failed after execution {}: {e}",
                    receipt.execution_hash
                );
                let mut rejection = self.fail_record(record.id, &reason, e).await;
                rejection.reached = Stage::Executed;
                return Err(rejection);
            }
        };
        drop(permit);

        if settlement.overshoot > 0 {
            self.metrics.settlement_overshoot.inc(&[]);
        }
        self.sync.enqueue(record.id);

        Ok(Sponsored {
            remaining_quota: ledger::remaining(policy.daily_limit, settlement.daily_spend),
            record: settlement.record,
            receipt,
        })
    }

    async fn validate_wallet(&self, address: &str) -> Result<WalletOwner> {
        let owner = self
            .directory
            .lookup_wallet(address)
            .await?
            .ok_or_else(|| SponsorError::WalletNotFound(address.to_string()))?;
        if !owner.status.is_active() {
            return Err(SponsorError::SponsorshipPaused);
        }
        Ok(owner)
    }

    /// Finalize FAILED; quota is not consumed.
    async fn fail_record(&self, id: RecordId, reason: &str, error: SponsorError) -> Rejection {
        match self.auditor.finalize_failure(id, reason).await {
            Ok(_) => {
                self.sync.enqueue(id);
            }
            Err(e) => {
                // Left PENDING; the sync sweep reports it as stale.
                tracing::error!(
                    record_id = %id,
                    error = %e,
                    "failed to finalize admission record as FAILED"
                );
            }
        }
        Rejection {
            error,
            reached: Stage::AuditedPending,
            record_id: Some(id),
        }
    }

    pub async fn record(&self, id: RecordId) -> Result<Option<AdmissionRecord>> {
        self.ledger_store.record(id).await
    }

    pub async fn set_sponsorship(&self, address: &str, active: bool) -> Result<SponsorshipStatus> {
        let status = if active {
            SponsorshipStatus::Active
        } else {
            SponsorshipStatus::Suspended
        };
        self.directory.set_sponsorship_status(address, status).await?;
        tracing::info!(wallet = %address, ?status, "sponsorship status changed");
        Ok(status)
    }

    /// Current platform spend in the live window.
    pub async fn platform_spend(&self) -> Result<u64> {
        self.cap.total(self.clock.now()).await
    }

    pub async fn gas_stats(&self) -> Result<GasStats> {
        let now = self.clock.now();
        let window_start = self.quota.window_start(now);

        let mut spends = self.ledger_store.wallet_spends(window_start).await?;
        let total_spent = spends.iter().fold(0u64, |acc, s| acc.saturating_add(s.daily_spend));
        let active_wallets = spends.len() as u64;
        let total_transactions = self.ledger_store.sponsored_count(window_start).await?;

        spends.sort_by(|a, b| {
            b.daily_spend
                .cmp(&a.daily_spend)
                .then_with(|| a.address.cmp(&b.address))
        });
        spends.truncate(self.top_spenders);

        let quotas = join_all(spends.iter().map(|s| self.quota_for(&s.address))).await;
        let top_spenders = spends
            .into_iter()
            .zip(quotas)
            .map(|(s, quota)| TopSpender {
                user_id: s.user_id,
                wallet_address: s.address,
                spent: s.daily_spend,
                quota,
            })
            .collect();

        Ok(GasStats {
            total_spent,
            active_wallets,
            total_transactions,
            platform_daily_limit: self.cap.cap(),
            cap_usage_pct: cap::usage_pct(total_spent, self.cap.cap()),
            top_spenders,
        })
    }

    /// Resolved daily limit for a wallet; zero when it cannot be resolved.
    async fn quota_for(&self, address: &str) -> u64 {
        let owner = match self.directory.lookup_wallet(address).await {
            Ok(Some(o)) => o,
            _ => return 0,
        };
        match self.resolver.resolve(owner.role.as_deref(), owner.tier.as_deref()).await {
            Ok(r) => r.policy.daily_limit,
            Err(_) => 0,
        }
    }
}
