//! Operation gate: static restricted/allowed rule matching.
//!
//! Rules are `category:operation` with `*` as a wildcard on either side, or a
//! bare operation name that matches in any category.

use sponsorgate_core::error::{Result, SponsorError};

/// Compiled gate rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRule {
    pub category: Option<String>,  // None => wildcard
    pub operation: Option<String>, // None => wildcard
}

pub fn compile_rules(raw: &[String]) -> Result<Vec<OperationRule>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let (category, operation) = match s.split_once(':') {
            Some((c, o)) => (wildcard(c, s)?, wildcard(o, s)?),
            None => (None, wildcard(s, s)?),
        };
        out.push(OperationRule { category, operation });
    }
    Ok(out)
}

fn wildcard(part: &str, rule: &str) -> Result<Option<String>> {
    let part = part.trim();
    if part.is_empty() {
        return Err(SponsorError::BadRequest(format!(
            "invalid operation rule: {rule} (expected category:operation)"
        )));
    }
    Ok(if part == "*" { None } else { Some(part.to_string()) })
}

pub fn is_match(rules: &[OperationRule], category: &str, operation: &str) -> bool {
    rules.iter().any(|r| {
        let cat_ok = r.category.as_deref().map_or(true, |c| c == category);
        let op_ok = r.operation.as_deref().map_or(true, |o| o == operation);
        cat_ok && op_ok
    })
}

/// Stateless pre-check, evaluated before any lookup.
#[derive(Debug, Clone)]
pub struct OperationGate {
    restricted: Vec<OperationRule>,
    allowed: Vec<OperationRule>,
}

impl OperationGate {
    pub fn new(restricted: &[String], allowed: &[String]) -> Result<Self> {
        Ok(Self {
            restricted: compile_rules(restricted)?,
            allowed: compile_rules(allowed)?,
        })
    }

    /// Restricted match wins; a non-empty allowlist denies unlisted operations.
    /// Inputs are compared trimmed, like the rules.
    pub fn check(&self, category: &str, operation: &str) -> Result<()> {
        let (category, operation) = (category.trim(), operation.trim());
        if is_match(&self.restricted, category, operation) {
            return Err(SponsorError::OperationRestricted(format!("{category}:{operation}")));
        }
        if !self.allowed.is_empty() && !is_match(&self.allowed, category, operation) {
            return Err(SponsorError::OperationRestricted(format!(
                "{category}:{operation} is not on the sponsorship allowlist"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use sponsorgate_core::error::RejectCode;

    fn rules(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_name_matches_any_category() {
        let gate = OperationGate::new(&rules(&["bulkDataExport"]), &[]).unwrap();
        let err = gate.check("reports", "bulkDataExport").unwrap_err();
        assert_eq!(err.code(), RejectCode::OperationRestricted);
        assert!(gate.check("orders", "fulfillOrder").is_ok());
    }

    #[test]
    fn padded_names_do_not_escape_rules() {
        let gate = OperationGate::new(&rules(&["bulkDataExport", "admin:*"]), &[]).unwrap();
        assert!(gate.check("reports", "bulkDataExport ").is_err());
        assert!(gate.check("reports", "\tbulkDataExport").is_err());
        assert!(gate.check(" admin", "setOwner").is_err());
    }

    #[test]
    fn category_wildcard() {
        let gate = OperationGate::new(&rules(&["admin:*"]), &[]).unwrap();
        assert!(gate.check("admin", "setOwner").is_err());
        assert!(gate.check("orders", "setOwner").is_ok());
    }

    #[test]
    fn allowlist_denies_unlisted_but_restricted_wins() {
        let gate = OperationGate::new(
            &rules(&["orders:refundAll"]),
            &rules(&["orders:*", "inventory:syncInventory"]),
        )
        .unwrap();
        assert!(gate.check("orders", "fulfillOrder").is_ok());
        assert!(gate.check("inventory", "syncInventory").is_ok());
        assert!(gate.check("inventory", "wipe").is_err());
        assert!(gate.check("orders", "refundAll").is_err());
    }

    #[test]
    fn malformed_rules_fail_to_compile() {
        assert!(compile_rules(&rules(&["orders:"])).is_err());
        assert!(compile_rules(&rules(&[":op"])).is_err());
    }
}
