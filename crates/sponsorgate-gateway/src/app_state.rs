//! Shared application state for the sponsorship gateway.
//!
//! Builds the in-memory store from the config seed, wires the dev relay and
//! the ledger sync worker, and composes the admission gateway. Startup errors
//! are returned, not panicked.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::model::{SpendingPolicy, User, WalletAccount};

use crate::admission::{Collaborators, SponsorshipGateway};
use crate::clock::{Clock, SystemClock};
use crate::config::{GatewayConfig, SeedSection};
use crate::obs::SponsorMetrics;
use crate::relay::{DevRelay, ExecutionRelay};
use crate::store::MemoryStore;
use crate::sync::{spawn_sync_worker, LedgerSync, LogLedgerSync};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    gateway: SponsorshipGateway,
    metrics: Arc<SponsorMetrics>,
}

impl AppState {
    /// Dev wiring: seeded `MemoryStore`, `DevRelay`, `LogLedgerSync`.
    /// Must be called inside a tokio runtime.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let store = Arc::new(seed_store(&cfg.seed)?);
        let relay: Arc<dyn ExecutionRelay> = Arc::new(DevRelay::new(
            cfg.relay.simulated_cost,
            Duration::from_millis(cfg.relay.latency_ms),
        ));
        let deps = Collaborators {
            directory: store.clone(),
            policies: store.clone(),
            ledger: store,
            relay,
        };
        Self::with_collaborators(cfg, deps, Arc::new(LogLedgerSync), Arc::new(SystemClock))
    }

    /// Wire the gateway against explicit collaborators.
    pub fn with_collaborators(
        cfg: GatewayConfig,
        deps: Collaborators,
        ledger_sync: Arc<dyn LedgerSync>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let metrics = Arc::new(SponsorMetrics::default());

        let (sync, _worker) = spawn_sync_worker(
            ledger_sync,
            Arc::clone(&deps.ledger),
            &cfg.sync,
            Arc::clone(&clock),
            Arc::clone(&metrics),
        )?;

        let gateway = SponsorshipGateway::new(
            &cfg.sponsorship,
            Duration::from_millis(cfg.gateway.execution_timeout_ms),
            deps,
            sync,
            clock,
            Arc::clone(&metrics),
        )
        .map_err(|e| SponsorError::BadRequest(format!("gateway setup failed: {e}")))?;

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, gateway, metrics }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn gateway(&self) -> &SponsorshipGateway {
        &self.inner.gateway
    }

    pub fn metrics(&self) -> &SponsorMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Gauge lines computed at scrape time.
    pub async fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let mut extra = vec![(
            "sponsorgate_platform_cap",
            self.inner.cfg.sponsorship.platform_daily_cap,
        )];
        match self.inner.gateway.platform_spend().await {
            Ok(total) => extra.push(("sponsorgate_platform_spend", total)),
            Err(e) => tracing::warn!(error = %e, "platform spend unavailable for metrics"),
        }
        extra
    }
}

fn seed_store(seed: &SeedSection) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    for p in &seed.policies {
        store.insert_policy(SpendingPolicy {
            id: Uuid::new_v4(),
            name: p.name.clone(),
            role: p.role.clone(),
            tier: p.tier.clone(),
            daily_limit: p.daily_limit,
            active: p.active,
        });
    }
    for u in &seed.users {
        store.insert_user(User {
            id: u.id.clone(),
            role: u.role.clone(),
            tier: u.tier.clone(),
        });
    }
    let now = Utc::now();
    for w in &seed.wallets {
        store.insert_wallet(WalletAccount {
            address: w.address.clone(),
            user_id: w.user_id.clone(),
            status: w.status,
            daily_spend: w.daily_spend,
            last_reset: now,
        })?;
    }
    tracing::info!(
        policies = seed.policies.len(),
        users = seed.users.len(),
        wallets = seed.wallets.len(),
        "in-memory store seeded"
    );
    Ok(store)
}
