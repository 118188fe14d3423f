//! Spend accounting: per-wallet quota windows and the platform cap.

pub mod cap;
pub mod ledger;
pub mod locks;

pub use cap::PlatformCapGuard;
pub use ledger::{QuotaCheck, QuotaLedger};
pub use locks::{WalletLocks, WalletPermit};
