#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use sponsorgate_core::model::{NewRecord, RecordId};
use sponsorgate_gateway::clock::SystemClock;
use sponsorgate_gateway::config::SyncSection;
use sponsorgate_gateway::obs::SponsorMetrics;
use sponsorgate_gateway::store::{LedgerStore, MemoryStore};
use sponsorgate_gateway::sync::spawn_sync_worker;
use support::{eventually, fast_sync, RecordingSync};

fn new_record() -> NewRecord {
    NewRecord {
        wallet_address: "0xw".into(),
        policy_id: Uuid::new_v4(),
        policy_name: "default".into(),
        target: "0xt".into(),
        operation: "fulfillOrder".into(),
        category: "orders".into(),
        batch_id: None,
        estimated_cost: 1,
        metadata: json!({}),
    }
}

async fn failed_record(store: &MemoryStore) -> RecordId {
    let rec = store.create_pending(new_record(), Utc::now()).await.unwrap();
    store.settle_failure(rec.id, "reverted", Utc::now()).await.unwrap();
    rec.id
}

async fn is_synced(store: &MemoryStore, id: RecordId) -> bool {
    for _ in 0..200 {
        if store.record(id).await.unwrap().and_then(|r| r.synced_at).is_some() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn startup_sweep_replays_unsynced_records() {
    let store = Arc::new(MemoryStore::new());
    let left_over = failed_record(&store).await;
    let still_pending = store.create_pending(new_record(), Utc::now()).await.unwrap().id;

    let sync = Arc::new(RecordingSync::default());
    let _worker = spawn_sync_worker(
        sync.clone(),
        store.clone(),
        &fast_sync(),
        Arc::new(SystemClock),
        Arc::new(SponsorMetrics::default()),
    )
    .unwrap();

    assert!(is_synced(&store, left_over).await);
    assert_eq!(sync.delivered(), vec![left_over]);
    assert!(store.record(still_pending).await.unwrap().unwrap().synced_at.is_none());
}

#[tokio::test]
async fn repeated_enqueue_delivers_once() {
    let store = Arc::new(MemoryStore::new());
    let sync = Arc::new(RecordingSync::default());
    let metrics = Arc::new(SponsorMetrics::default());
    let (queue, _worker) = spawn_sync_worker(
        sync.clone(),
        store.clone(),
        &fast_sync(),
        Arc::new(SystemClock),
        metrics.clone(),
    )
    .unwrap();

    let id = failed_record(&store).await;
    for _ in 0..5 {
        assert!(queue.enqueue(id));
    }
    assert!(is_synced(&store, id).await);
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(sync.delivered(), vec![id]);
    assert_eq!(metrics.sync_events.get(&[("event", "delivered")]), 1);
}

#[tokio::test]
async fn exhausted_retries_are_picked_up_by_the_sweep() {
    let store = Arc::new(MemoryStore::new());
    // Two attempts per dispatch; the third overall call succeeds.
    let cfg = SyncSection {
        max_attempts: 2,
        ..fast_sync()
    };
    let sync = Arc::new(RecordingSync::failing_first(2));
    let metrics = Arc::new(SponsorMetrics::default());
    let (queue, _worker) = spawn_sync_worker(
        sync.clone(),
        store.clone(),
        &cfg,
        Arc::new(SystemClock),
        metrics.clone(),
    )
    .unwrap();

    let id = failed_record(&store).await;
    queue.enqueue(id);

    assert!(is_synced(&store, id).await);
    assert!(sync.attempts.load(Ordering::SeqCst) >= 3);
    assert_eq!(metrics.sync_events.get(&[("event", "failed")]), 1);
    assert_eq!(sync.delivered(), vec![id]);
}

#[tokio::test]
async fn full_queue_defers_to_sweep() {
    let store = Arc::new(MemoryStore::new());
    let sync = Arc::new(RecordingSync::default());
    let metrics = Arc::new(SponsorMetrics::default());
    let cfg = SyncSection {
        queue_capacity: 1,
        ..fast_sync()
    };
    let (queue, _worker) = spawn_sync_worker(
        sync.clone(),
        store.clone(),
        &cfg,
        Arc::new(SystemClock),
        metrics.clone(),
    )
    .unwrap();

    let mut ids = Vec::new();
    for _ in 0..8 {
        ids.push(failed_record(&store).await);
    }
    // No await between sends: the worker cannot drain, so the channel fills.
    let queued = ids.iter().filter(|id| queue.enqueue(**id)).count();
    assert!(queued < ids.len());
    assert!(metrics.sync_events.get(&[("event", "dropped")]) > 0);

    for id in &ids {
        assert!(is_synced(&store, *id).await, "{id}");
    }
    assert!(eventually(|| sync.delivered().len() == ids.len()).await);
}
