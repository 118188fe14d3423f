/// Progress of one request through the pipeline, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    GateChecked,
    WalletValidated,
    PolicyResolved,
    QuotaChecked,
    CapChecked,
    /// From here on an admission record exists.
    AuditedPending,
    Executed,
    Finalized,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::GateChecked => "gate_checked",
            Stage::WalletValidated => "wallet_validated",
            Stage::PolicyResolved => "policy_resolved",
            Stage::QuotaChecked => "quota_checked",
            Stage::CapChecked => "cap_checked",
            Stage::AuditedPending => "audited_pending",
            Stage::Executed => "executed",
            Stage::Finalized => "finalized",
        }
    }

    pub fn has_record(self) -> bool {
        self >= Stage::AuditedPending
    }
}
