//! Governance views: platform gas stats and the sponsorship toggle.

use serde::{Deserialize, Serialize};

/// Platform-wide sponsorship usage for the current window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasStats {
    pub total_spent: u64,
    pub active_wallets: u64,
    pub total_transactions: u64,
    pub platform_daily_limit: u64,
    pub cap_usage_pct: f64,
    pub top_spenders: Vec<TopSpender>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSpender {
    pub user_id: String,
    pub wallet_address: String,
    pub spent: u64,
    pub quota: u64,
}

/// Suspend or reinstate sponsorship for one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SponsorshipToggle {
    pub wallet_address: String,
    pub is_active: bool,
}
