//! Per-wallet exclusive sections.
//!
//! An admission holds its wallet's permit from the quota check until the
//! settlement is written, so check-and-commit never interleaves for one
//! wallet. Different wallets use different mutexes and never contend.
//!
//! Entries are never evicted. A permit is only requested after the wallet
//! passed directory validation, so the table is bounded by the number of
//! known wallets.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct WalletLocks {
    map: DashMap<String, Arc<Mutex<()>>>,
}

/// Proof that the holder is the only in-flight admission for `address`.
#[derive(Debug)]
pub struct WalletPermit {
    address: String,
    _guard: OwnedMutexGuard<()>,
}

impl WalletPermit {
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, address: &str) -> WalletPermit {
        // Clone the Arc out so the shard guard is released before awaiting.
        let lock = self
            .map
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let guard = lock.lock_owned().await;
        WalletPermit {
            address: address.to_string(),
            _guard: guard,
        }
    }
}
