//! Spending policy resolution for a (role, tier) pair.
//!
//! Precedence, first match wins:
//! 1. role and tier
//! 2. tier only
//! 3. role only
//! 4. an existing unfiltered policy, else the named fallback, upserted if absent
//!
//! An inactive match is an error; no other policy is substituted.

use std::sync::Arc;

use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::model::{PolicyDefaults, SpendingPolicy};

use crate::store::PolicyStore;

/// Which precedence step produced the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMatch {
    RoleAndTier,
    TierOnly,
    RoleOnly,
    Fallback,
}

impl PolicyMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyMatch::RoleAndTier => "role_and_tier",
            PolicyMatch::TierOnly => "tier_only",
            PolicyMatch::RoleOnly => "role_only",
            PolicyMatch::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub policy: SpendingPolicy,
    pub matched: PolicyMatch,
}

pub struct PolicyResolver {
    store: Arc<dyn PolicyStore>,
    fallback_name: String,
    fallback_limit: u64,
}

impl PolicyResolver {
    pub fn new(
        store: Arc<dyn PolicyStore>,
        fallback_name: impl Into<String>,
        fallback_limit: u64,
    ) -> Self {
        Self {
            store,
            fallback_name: fallback_name.into(),
            fallback_limit,
        }
    }

    pub async fn resolve(&self, role: Option<&str>, tier: Option<&str>) -> Result<Resolution> {
        let found = self.find(role, tier).await?;
        let (policy, matched) = match found {
            Some(hit) => hit,
            None => (self.fallback().await?, PolicyMatch::Fallback),
        };

        if !policy.active {
            return Err(SponsorError::PolicyInactive(policy.name));
        }

        tracing::debug!(policy = %policy.name, matched = matched.as_str(), "policy resolved");
        Ok(Resolution { policy, matched })
    }

    async fn find(
        &self,
        role: Option<&str>,
        tier: Option<&str>,
    ) -> Result<Option<(SpendingPolicy, PolicyMatch)>> {
        if let (Some(r), Some(t)) = (role, tier) {
            if let Some(p) = self.store.find_policy(Some(r), Some(t)).await? {
                return Ok(Some((p, PolicyMatch::RoleAndTier)));
            }
        }
        if let Some(t) = tier {
            if let Some(p) = self.store.find_policy(None, Some(t)).await? {
                return Ok(Some((p, PolicyMatch::TierOnly)));
            }
        }
        if let Some(r) = role {
            if let Some(p) = self.store.find_policy(Some(r), None).await? {
                return Ok(Some((p, PolicyMatch::RoleOnly)));
            }
        }
        Ok(None)
    }

    async fn fallback(&self) -> Result<SpendingPolicy> {
        if let Some(p) = self.store.find_policy(None, None).await? {
            return Ok(p);
        }
        self.store
            .upsert_policy(
                &self.fallback_name,
                PolicyDefaults {
                    role: None,
                    tier: None,
                    daily_limit: self.fallback_limit,
                    active: true,
                },
            )
            .await
    }
}
