//! Quota ledger: rolling window reset and the admission rule.
//!
//! The window starts at the wallet's stored reset time and lasts
//! `window` (24h by default). A request observed after the window has
//! elapsed resets the accumulator before its own charge is evaluated.
//! Admission is `spend + charge <= limit`; a rejection does not touch spend.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::model::SpendingPolicy;

use super::locks::{WalletLocks, WalletPermit};
use crate::store::{LedgerStore, QuotaCommit};

pub fn window_elapsed(last_reset: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(last_reset) >= window
}

pub fn admits(spend: u64, charge: u64, limit: u64) -> bool {
    spend.checked_add(charge).is_some_and(|total| total <= limit)
}

pub fn remaining(limit: u64, spend: u64) -> u64 {
    limit.saturating_sub(spend)
}

/// A provisionally admitted charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaCheck {
    pub limit: u64,
    pub current_spend: u64,
    pub charge: u64,
    pub was_reset: bool,
}

pub struct QuotaLedger {
    store: Arc<dyn LedgerStore>,
    window: Duration,
    locks: WalletLocks,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn LedgerStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            locks: WalletLocks::new(),
        }
    }

    /// Windows that started at or before this instant have elapsed.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    pub async fn lock_wallet(&self, address: &str) -> WalletPermit {
        self.locks.acquire(address).await
    }

    pub async fn check(
        &self,
        permit: &WalletPermit,
        policy: &SpendingPolicy,
        charge: u64,
        now: DateTime<Utc>,
    ) -> Result<QuotaCheck> {
        let address = permit.address();
        let mut snap = self
            .store
            .quota(address)
            .await?
            .ok_or_else(|| SponsorError::WalletNotFound(address.to_string()))?;

        let was_reset = window_elapsed(snap.last_reset, now, self.window);
        if was_reset {
            tracing::debug!(
                wallet = %address,
                previous_spend = snap.daily_spend,
                "quota window reset"
            );
            snap = self.store.reset_window(address, now).await?;
        }

        if !admits(snap.daily_spend, charge, policy.daily_limit) {
            return Err(SponsorError::QuotaExceeded {
                limit: policy.daily_limit,
                current_spend: snap.daily_spend,
                charge,
            });
        }

        Ok(QuotaCheck {
            limit: policy.daily_limit,
            current_spend: snap.daily_spend,
            charge,
            was_reset,
        })
    }

    /// Increment to apply with the SUCCESS finalization.
    pub fn commitment(&self, permit: &WalletPermit, policy: &SpendingPolicy) -> QuotaCommit {
        QuotaCommit {
            wallet_address: permit.address().to_string(),
            daily_limit: policy.daily_limit,
        }
    }
}
