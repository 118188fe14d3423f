use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::model::RecordId;

use super::LedgerSync;
use crate::clock::Clock;
use crate::config::SyncSection;
use crate::obs::SponsorMetrics;
use crate::store::LedgerStore;

const SWEEP_BATCH: usize = 256;

/// Producer side. `enqueue` never waits.
#[derive(Clone)]
pub struct SyncQueue {
    tx: mpsc::Sender<RecordId>,
    metrics: Arc<SponsorMetrics>,
}

impl SyncQueue {
    /// Returns `false` if the record was not queued; the sweep picks it up later.
    pub fn enqueue(&self, id: RecordId) -> bool {
        match self.tx.try_send(id) {
            Ok(()) => {
                self.metrics.sync_events.inc(&[("event", "queued")]);
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(record_id = %id, "ledger sync queue full; deferring to sweep");
                self.metrics.sync_events.inc(&[("event", "dropped")]);
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!(record_id = %id, "ledger sync worker stopped");
                self.metrics.sync_events.inc(&[("event", "dropped")]);
                false
            }
        }
    }
}

struct Delivery {
    sync: Arc<dyn LedgerSync>,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<SponsorMetrics>,
    in_flight: DashSet<RecordId>,
    /// Stuck PENDING records already reported, so each is logged once.
    reported_stale: DashSet<RecordId>,
    stale_after: chrono::Duration,
    max_attempts: u32,
    base_backoff: Duration,
}

/// Start the worker on the current tokio runtime.
pub fn spawn_sync_worker(
    sync: Arc<dyn LedgerSync>,
    store: Arc<dyn LedgerStore>,
    cfg: &SyncSection,
    clock: Arc<dyn Clock>,
    metrics: Arc<SponsorMetrics>,
) -> Result<(SyncQueue, JoinHandle<()>)> {
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|e| SponsorError::Internal(format!("sync worker needs a tokio runtime: {e}")))?;

    let stale_ms = i64::try_from(cfg.stale_pending_ms)
        .map_err(|_| SponsorError::BadRequest("sync.stale_pending_ms out of range".into()))?;

    let (tx, rx) = mpsc::channel(cfg.queue_capacity);
    let delivery = Arc::new(Delivery {
        sync,
        store,
        clock,
        metrics: Arc::clone(&metrics),
        in_flight: DashSet::new(),
        reported_stale: DashSet::new(),
        stale_after: chrono::Duration::milliseconds(stale_ms),
        max_attempts: cfg.max_attempts,
        base_backoff: Duration::from_millis(cfg.base_backoff_ms),
    });
    let sweep_every = Duration::from_millis(cfg.sweep_interval_ms);

    let task = handle.spawn(run_worker(delivery, rx, sweep_every));
    Ok((SyncQueue { tx, metrics }, task))
}

async fn run_worker(
    delivery: Arc<Delivery>,
    mut rx: mpsc::Receiver<RecordId>,
    sweep_every: Duration,
) {
    // First tick fires immediately: replays anything left unsynced at startup.
    let mut sweep = tokio::time::interval(sweep_every);
    sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            maybe_id = rx.recv() => {
                let Some(id) = maybe_id else { break; };
                dispatch(&delivery, id);
            }
            _ = sweep.tick() => {
                match delivery.store.unsynced_records(SWEEP_BATCH).await {
                    Ok(ids) => {
                        if !ids.is_empty() {
                            tracing::debug!(count = ids.len(), "ledger sync sweep");
                        }
                        for id in ids {
                            dispatch(&delivery, id);
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "ledger sync sweep failed"),
                }
                report_stale(&delivery).await;
            }
        }
    }
    tracing::info!("ledger sync worker stopped");
}

/// PENDING records past `stale_after` never reached a final state and are
/// invisible to the sync sweep; surface them for operators.
async fn report_stale(d: &Delivery) {
    let cutoff = d.clock.now() - d.stale_after;
    match d.store.stale_pending(cutoff, SWEEP_BATCH).await {
        Ok(ids) => {
            for id in ids {
                if d.reported_stale.insert(id) {
                    tracing::error!(record_id = %id, "admission record stuck in PENDING");
                    d.metrics.sync_events.inc(&[("event", "stale_pending")]);
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "stale pending scan failed"),
    }
}

fn dispatch(delivery: &Arc<Delivery>, id: RecordId) {
    if !delivery.in_flight.insert(id) {
        return;
    }
    let delivery = Arc::clone(delivery);
    tokio::spawn(async move {
        deliver(&delivery, id).await;
        delivery.in_flight.remove(&id);
    });
}

async fn deliver(d: &Delivery, id: RecordId) {
    match d.store.record(id).await {
        Ok(Some(rec)) if rec.synced_at.is_some() => {
            d.metrics.sync_events.inc(&[("event", "duplicate")]);
            return;
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::error!(record_id = %id, "ledger sync for unknown record");
            return;
        }
        Err(e) => {
            // Leave it for the next sweep.
            tracing::warn!(record_id = %id, error = %e, "ledger sync lookup failed");
            return;
        }
    }

    for attempt in 1..=d.max_attempts {
        match d.sync.sync_record(id).await {
            Ok(()) => {
                if let Err(e) = d.store.mark_synced(id, d.clock.now()).await {
                    tracing::warn!(
                        record_id = %id,
                        error = %e,
                        "ledger sync delivered but not recorded"
                    );
                }
                d.metrics.sync_events.inc(&[("event", "delivered")]);
                return;
            }
            Err(e) if attempt < d.max_attempts => {
                let backoff = d.base_backoff.saturating_mul(1u32 << (attempt - 1).min(16));
                tracing::warn!(
                    record_id = %id,
                    attempt,
                    error = %e,
                    ?backoff,
                    "ledger sync failed; retrying"
                );
                d.metrics.sync_events.inc(&[("event", "retried")]);
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::error!(
                    record_id = %id,
                    attempts = attempt,
                    error = %e,
                    "ledger sync giving up until next sweep"
                );
                d.metrics.sync_events.inc(&[("event", "failed")]);
            }
        }
    }
}
