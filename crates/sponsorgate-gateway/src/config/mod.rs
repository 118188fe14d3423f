//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use sponsorgate_core::error::{Result, SponsorError};

pub use schema::{
    FallbackPolicy, GatewayConfig, GatewaySection, RelaySection, SeedSection, SponsorshipSection,
    SyncSection,
};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SponsorError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| SponsorError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
