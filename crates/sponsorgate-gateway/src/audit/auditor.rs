//! Creates the PENDING record right before execution and finalizes it once
//! the relay returns. Records are never deleted and never leave a final
//! state.

use std::sync::Arc;

use sponsorgate_core::error::Result;
use sponsorgate_core::model::{AdmissionRecord, ExecutionReceipt, NewRecord, RecordId};

use crate::clock::Clock;
use crate::store::{LedgerStore, QuotaCommit, Settlement};

pub struct TransactionAuditor {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl TransactionAuditor {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn open(&self, new: NewRecord) -> Result<AdmissionRecord> {
        let record = self.store.create_pending(new, self.clock.now()).await?;
        tracing::debug!(record_id = %record.id, "admission record pending");
        Ok(record)
    }

    /// SUCCESS, with the quota increment applied in the same settlement.
    pub async fn finalize_success(
        &self,
        id: RecordId,
        receipt: &ExecutionReceipt,
        commit: &QuotaCommit,
    ) -> Result<Settlement> {
        let settlement = self
            .store
            .settle_success(id, receipt, commit, self.clock.now())
            .await?;
        if settlement.overshoot > 0 {
            tracing::warn!(
                record_id = %id,
                wallet = %commit.wallet_address,
                actual_cost = receipt.actual_cost,
                overshoot = settlement.overshoot,
                "actual cost exceeded remaining quota; committed spend clamped to limit"
            );
        }
        Ok(settlement)
    }

    pub async fn finalize_failure(&self, id: RecordId, reason: &str) -> Result<AdmissionRecord> {
        self.store.settle_failure(id, reason, self.clock.now()).await
    }
}
