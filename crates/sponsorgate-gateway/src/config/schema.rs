use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::model::SponsorshipStatus;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub sponsorship: SponsorshipSection,

    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub seed: SeedSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SponsorError::BadRequest(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.sponsorship.validate()?;
        self.sync.validate()?;
        self.relay.validate()?;
        self.seed.validate()?;

        if self.sync.stale_pending_ms <= self.gateway.execution_timeout_ms {
            return Err(SponsorError::BadRequest(
                "sync.stale_pending_ms must exceed gateway.execution_timeout_ms".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upper bound on one relay call.
    #[serde(default = "default_execution_timeout_ms")]
    pub execution_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            execution_timeout_ms: default_execution_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(SponsorError::BadRequest(format!(
                "gateway.listen must be a valid socket address, got {}",
                self.listen
            )));
        }
        if !(100..=120_000).contains(&self.execution_timeout_ms) {
            return Err(SponsorError::BadRequest(
                "gateway.execution_timeout_ms must be between 100 and 120000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_execution_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SponsorshipSection {
    /// Aggregate spend ceiling across all wallets for one window.
    #[serde(default = "default_platform_daily_cap")]
    pub platform_daily_cap: u64,

    /// Percentage of the cap at which admissions start logging warnings.
    #[serde(default = "default_cap_warn_pct")]
    pub cap_warn_pct: u8,

    /// Length of the rolling quota window.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Prospective charge used when a request carries no estimate.
    #[serde(default = "default_charge")]
    pub default_charge: u64,

    #[serde(default)]
    pub fallback_policy: FallbackPolicy,

    /// `category:operation` rules (`*` wildcard) or bare operation names.
    #[serde(default = "default_restricted_operations")]
    pub restricted_operations: Vec<String>,

    /// When non-empty, only matching operations may be sponsored.
    #[serde(default)]
    pub allowed_operations: Vec<String>,

    /// Rows returned by the admin stats view.
    #[serde(default = "default_top_spenders")]
    pub top_spenders: usize,
}

impl Default for SponsorshipSection {
    fn default() -> Self {
        Self {
            platform_daily_cap: default_platform_daily_cap(),
            cap_warn_pct: default_cap_warn_pct(),
            window_secs: default_window_secs(),
            default_charge: default_charge(),
            fallback_policy: FallbackPolicy::default(),
            restricted_operations: default_restricted_operations(),
            allowed_operations: Vec::new(),
            top_spenders: default_top_spenders(),
        }
    }
}

impl SponsorshipSection {
    pub fn validate(&self) -> Result<()> {
        if self.platform_daily_cap == 0 {
            return Err(SponsorError::BadRequest(
                "sponsorship.platform_daily_cap must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.cap_warn_pct) {
            return Err(SponsorError::BadRequest(
                "sponsorship.cap_warn_pct must be between 1 and 100".into(),
            ));
        }
        if !(60..=7 * 86_400).contains(&self.window_secs) {
            return Err(SponsorError::BadRequest(
                "sponsorship.window_secs must be between 60 and 604800".into(),
            ));
        }
        if self.default_charge == 0 {
            return Err(SponsorError::BadRequest(
                "sponsorship.default_charge must be greater than 0".into(),
            ));
        }
        if !(1..=1000).contains(&self.top_spenders) {
            return Err(SponsorError::BadRequest(
                "sponsorship.top_spenders must be between 1 and 1000".into(),
            ));
        }
        self.fallback_policy.validate()?;

        for rule in self.restricted_operations.iter().chain(&self.allowed_operations) {
            if rule.trim().is_empty() {
                return Err(SponsorError::BadRequest(
                    "sponsorship operation rules must not be blank".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_platform_daily_cap() -> u64 {
    200_000_000
}
fn default_cap_warn_pct() -> u8 {
    80
}
fn default_window_secs() -> u64 {
    86_400
}
fn default_charge() -> u64 {
    30_000
}
fn default_restricted_operations() -> Vec<String> {
    vec!["bulkDataExport".into()]
}
fn default_top_spenders() -> usize {
    10
}

/// Policy created on demand when no filtered policy matches.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackPolicy {
    #[serde(default = "default_fallback_name")]
    pub name: String,
    #[serde(default = "default_fallback_daily_limit")]
    pub daily_limit: u64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            name: default_fallback_name(),
            daily_limit: default_fallback_daily_limit(),
        }
    }
}

impl FallbackPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SponsorError::BadRequest(
                "sponsorship.fallback_policy.name must not be empty".into(),
            ));
        }
        if self.daily_limit == 0 {
            return Err(SponsorError::BadRequest(
                "sponsorship.fallback_policy.daily_limit must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_fallback_name() -> String {
    "default".into()
}
fn default_fallback_daily_limit() -> u64 {
    500_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Age after which a PENDING record is reported as stuck by the sweep.
    #[serde(default = "default_stale_pending_ms")]
    pub stale_pending_ms: u64,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            stale_pending_ms: default_stale_pending_ms(),
        }
    }
}

impl SyncSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1_000_000).contains(&self.queue_capacity) {
            return Err(SponsorError::BadRequest(
                "sync.queue_capacity must be between 1 and 1000000".into(),
            ));
        }
        if !(1..=20).contains(&self.max_attempts) {
            return Err(SponsorError::BadRequest(
                "sync.max_attempts must be between 1 and 20".into(),
            ));
        }
        if !(1..=60_000).contains(&self.base_backoff_ms) {
            return Err(SponsorError::BadRequest(
                "sync.base_backoff_ms must be between 1 and 60000".into(),
            ));
        }
        if !(100..=3_600_000).contains(&self.sweep_interval_ms) {
            return Err(SponsorError::BadRequest(
                "sync.sweep_interval_ms must be between 100 and 3600000".into(),
            ));
        }
        if !(1_000..=86_400_000).contains(&self.stale_pending_ms) {
            return Err(SponsorError::BadRequest(
                "sync.stale_pending_ms must be between 1000 and 86400000".into(),
            ));
        }
        Ok(())
    }
}

fn default_queue_capacity() -> usize {
    1024
}
fn default_max_attempts() -> u32 {
    5
}
fn default_base_backoff_ms() -> u64 {
    200
}
fn default_sweep_interval_ms() -> u64 {
    30_000
}
fn default_stale_pending_ms() -> u64 {
    120_000
}

/// Dev relay behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Actual cost reported for every execution; `0` echoes the estimate.
    #[serde(default)]
    pub simulated_cost: u64,
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            simulated_cost: 0,
            latency_ms: 0,
        }
    }
}

impl RelaySection {
    pub fn validate(&self) -> Result<()> {
        if self.latency_ms > 60_000 {
            return Err(SponsorError::BadRequest(
                "relay.latency_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }
}

/// Initial rows for the in-memory store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSection {
    #[serde(default)]
    pub policies: Vec<SeedPolicy>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub wallets: Vec<SeedWallet>,
}

impl SeedSection {
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for p in &self.policies {
            if !names.insert(p.name.as_str()) {
                return Err(SponsorError::BadRequest(format!(
                    "seed.policies: duplicate policy name {}",
                    p.name
                )));
            }
        }

        let unfiltered: Vec<&str> = self
            .policies
            .iter()
            .filter(|p| p.role.is_none() && p.tier.is_none())
            .map(|p| p.name.as_str())
            .collect();
        if unfiltered.len() > 1 {
            return Err(SponsorError::BadRequest(format!(
                "seed.policies: at most one policy without role and tier, got {}",
                unfiltered.join(", ")
            )));
        }

        let users: HashSet<&str> = self.users.iter().map(|u| u.id.as_str()).collect();
        let mut addresses = HashSet::new();
        for w in &self.wallets {
            if !users.contains(w.user_id.as_str()) {
                return Err(SponsorError::BadRequest(format!(
                    "seed.wallets: wallet {} references unknown user {}",
                    w.address, w.user_id
                )));
            }
            if !addresses.insert(w.address.as_str()) {
                return Err(SponsorError::BadRequest(format!(
                    "seed.wallets: duplicate address {}",
                    w.address
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPolicy {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    pub daily_limit: u64,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedWallet {
    pub address: String,
    pub user_id: String,
    #[serde(default = "default_status")]
    pub status: SponsorshipStatus,
    #[serde(default)]
    pub daily_spend: u64,
}

fn default_true() -> bool {
    true
}
fn default_status() -> SponsorshipStatus {
    SponsorshipStatus::Active
}
