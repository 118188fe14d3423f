//! Private-ledger synchronization, decoupled from the request path.
//!
//! Finalized admission records are handed to a bounded outbound queue. A
//! worker delivers them with retry/backoff; a periodic sweep re-enqueues any
//! record still unsynced, so delivery is at-least-once and the consumer must
//! be idempotent on the record id.

pub mod queue;

use async_trait::async_trait;

use sponsorgate_core::error::Result;
use sponsorgate_core::model::RecordId;

pub use queue::{spawn_sync_worker, SyncQueue};

#[async_trait]
pub trait LedgerSync: Send + Sync {
    async fn sync_record(&self, id: RecordId) -> Result<()>;
}

/// Logs each record instead of contacting a ledger.
#[derive(Debug, Default)]
pub struct LogLedgerSync;

#[async_trait]
impl LedgerSync for LogLedgerSync {
    async fn sync_record(&self, id: RecordId) -> Result<()> {
        tracing::info!(record_id = %id, "ledger sync");
        Ok(())
    }
}
