//! Shared error type across sponsorgate crates.

use thiserror::Error;

/// Client-facing rejection codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectCode {
    /// Malformed or incomplete request.
    BadRequest,
    /// Wallet address not known to the directory.
    WalletNotFound,
    /// Wallet sponsorship is not active.
    SponsorshipPaused,
    /// Operation is categorically excluded from sponsorship.
    OperationRestricted,
    /// Resolved policy exists but is disabled.
    PolicyInactive,
    /// Wallet daily spend would be exceeded.
    QuotaExceeded,
    /// Aggregate platform spend ceiling reached.
    PlatformCapReached,
    /// Execution collaborator failed or timed out.
    ExecutionFailed,
    /// Internal server error.
    Internal,
}

impl RejectCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectCode::BadRequest => "BAD_REQUEST",
            RejectCode::WalletNotFound => "WALLET_NOT_FOUND",
            RejectCode::SponsorshipPaused => "SPONSORSHIP_PAUSED",
            RejectCode::OperationRestricted => "OPERATION_RESTRICTED",
            RejectCode::PolicyInactive => "POLICY_INACTIVE",
            RejectCode::QuotaExceeded => "QUOTA_EXCEEDED",
            RejectCode::PlatformCapReached => "PLATFORM_CAP_REACHED",
            RejectCode::ExecutionFailed => "EXECUTION_FAILED",
            RejectCode::Internal => "INTERNAL",
        }
    }

    /// HTTP-style status for the rejection.
    pub fn http_status(self) -> u16 {
        match self {
            RejectCode::BadRequest => 400,
            RejectCode::WalletNotFound => 404,
            RejectCode::SponsorshipPaused
            | RejectCode::OperationRestricted
            | RejectCode::PolicyInactive => 403,
            RejectCode::QuotaExceeded | RejectCode::PlatformCapReached => 429,
            RejectCode::ExecutionFailed | RejectCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SponsorError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum SponsorError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("wallet not found: {0}")]
    WalletNotFound(String),
    #[error("sponsorship paused for wallet")]
    SponsorshipPaused,
    #[error("operation restricted: {0}")]
    OperationRestricted(String),
    #[error("policy inactive: {0}")]
    PolicyInactive(String),
    #[error("daily quota exceeded (limit {limit}, current spend {current_spend}, charge {charge})")]
    QuotaExceeded {
        limit: u64,
        current_spend: u64,
        charge: u64,
    },
    #[error("platform sponsorship cap reached ({total}/{cap})")]
    PlatformCapReached { cap: u64, total: u64 },
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl SponsorError {
    /// Map internal error to a stable client-facing code.
    pub fn code(&self) -> RejectCode {
        match self {
            SponsorError::BadRequest(_) => RejectCode::BadRequest,
            SponsorError::WalletNotFound(_) => RejectCode::WalletNotFound,
            SponsorError::SponsorshipPaused => RejectCode::SponsorshipPaused,
            SponsorError::OperationRestricted(_) => RejectCode::OperationRestricted,
            SponsorError::PolicyInactive(_) => RejectCode::PolicyInactive,
            SponsorError::QuotaExceeded { .. } => RejectCode::QuotaExceeded,
            SponsorError::PlatformCapReached { .. } => RejectCode::PlatformCapReached,
            SponsorError::ExecutionFailed(_) => RejectCode::ExecutionFailed,
            SponsorError::Internal(_) => RejectCode::Internal,
        }
    }

    /// Message safe to return to callers.
    ///
    /// Execution and internal failures are reported generically; their detail
    /// stays in logs and the admission record.
    pub fn public_message(&self) -> String {
        match self {
            SponsorError::ExecutionFailed(_) => "sponsored execution failed".into(),
            SponsorError::Internal(_) => "internal error".into(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(RejectCode::BadRequest.http_status(), 400);
        assert_eq!(RejectCode::SponsorshipPaused.http_status(), 403);
        assert_eq!(RejectCode::OperationRestricted.http_status(), 403);
        assert_eq!(RejectCode::PolicyInactive.http_status(), 403);
        assert_eq!(RejectCode::QuotaExceeded.http_status(), 429);
        assert_eq!(RejectCode::PlatformCapReached.http_status(), 429);
        assert_eq!(RejectCode::ExecutionFailed.http_status(), 500);
    }

    #[test]
    fn execution_detail_is_not_public() {
        let e = SponsorError::ExecutionFailed("relay 10.0.0.3 refused".into());
        assert_eq!(e.code(), RejectCode::ExecutionFailed);
        assert!(!e.public_message().contains("10.0.0.3"));
    }
}
