//! Transaction auditor: admission record lifecycle.

pub mod auditor;

pub use auditor::TransactionAuditor;
