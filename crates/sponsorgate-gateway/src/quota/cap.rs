//! Platform cap guard.
//!
//! Sums live-window spend across all wallets. Soft ceiling: the sum is a
//! snapshot and concurrent admissions for other wallets may overshoot it
//! slightly.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use sponsorgate_core::error::{Result, SponsorError};

use crate::store::LedgerStore;

pub fn usage_pct(total: u64, cap: u64) -> f64 {
    if cap == 0 {
        return 100.0;
    }
    total as f64 * 100.0 / cap as f64
}

pub struct PlatformCapGuard {
    store: Arc<dyn LedgerStore>,
    cap: u64,
    warn_pct: u8,
    window: Duration,
}

impl PlatformCapGuard {
    pub fn new(store: Arc<dyn LedgerStore>, cap: u64, warn_pct: u8, window: Duration) -> Self {
        Self {
            store,
            cap,
            warn_pct,
            window,
        }
    }

    pub fn cap(&self) -> u64 {
        self.cap
    }

    pub async fn total(&self, now: DateTime<Utc>) -> Result<u64> {
        self.store.live_spend_total(now - self.window).await
    }

    /// Rejects once aggregate spend meets or exceeds the cap.
    pub async fn check(&self, now: DateTime<Utc>) -> Result<u64> {
        let total = self.total(now).await?;
        if total >= self.cap {
            return Err(SponsorError::PlatformCapReached {
                cap: self.cap,
                total,
            });
        }

        let pct = usage_pct(total, self.cap);
        if pct >= f64::from(self.warn_pct) {
            tracing::warn!(
                total,
                cap = self.cap,
                usage_pct = pct,
                "platform sponsorship spend nearing cap"
            );
        }
        Ok(total)
    }
}
