#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sponsorgate_core::model::SponsorshipStatus;
use sponsorgate_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
sponsorship:
  fallback_policy:
    name: "default"
    daily_limitz: 500000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.sponsorship.platform_daily_cap, 200_000_000);
    assert_eq!(cfg.sponsorship.fallback_policy.name, "default");
    assert_eq!(cfg.sponsorship.fallback_policy.daily_limit, 500_000);
    assert_eq!(cfg.sponsorship.restricted_operations, vec!["bulkDataExport".to_string()]);
    assert!(cfg.seed.wallets.is_empty());
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn rejects_out_of_range_values() {
    let cases = [
        "version: 1\ngateway:\n  listen: \"not-an-addr\"\n",
        "version: 1\ngateway:\n  execution_timeout_ms: 10\n",
        "version: 1\nsponsorship:\n  cap_warn_pct: 0\n",
        "version: 1\nsponsorship:\n  window_secs: 5\n",
        "version: 1\nsponsorship:\n  platform_daily_cap: 0\n",
        "version: 1\nsponsorship:\n  restricted_operations: [\"  \"]\n",
        "version: 1\nsync:\n  max_attempts: 0\n",
        "version: 1\nsync:\n  stale_pending_ms: 500\n",
        "version: 1\ngateway:\n  execution_timeout_ms: 60000\nsync:\n  stale_pending_ms: 30000\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.code().as_str(), "BAD_REQUEST", "{yaml}");
    }
}

#[test]
fn seed_rows_parse_with_defaults() {
    let ok = r#"
version: 1
seed:
  policies:
    - name: "merchant-gold"
      role: "merchant"
      tier: "gold"
      daily_limit: 2000000
  users:
    - id: "user-1"
      role: "merchant"
      tier: "gold"
  wallets:
    - address: "0xabc"
      user_id: "user-1"
    - address: "0xdef"
      user_id: "user-1"
      status: SUSPENDED
      daily_spend: 1200
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert!(cfg.seed.policies[0].active);
    assert_eq!(cfg.seed.wallets[0].status, SponsorshipStatus::Active);
    assert_eq!(cfg.seed.wallets[1].status, SponsorshipStatus::Suspended);
    assert_eq!(cfg.seed.wallets[1].daily_spend, 1200);
}

#[test]
fn seed_wallet_must_reference_known_user() {
    let bad = r#"
version: 1
seed:
  wallets:
    - address: "0xabc"
      user_id: "ghost"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("unknown user"), "{err}");
}

#[test]
fn seed_policy_names_are_unique() {
    let bad = r#"
version: 1
seed:
  policies:
    - { name: "gold", tier: "gold", daily_limit: 1 }
    - { name: "gold", role: "merchant", daily_limit: 2 }
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn seed_allows_one_unfiltered_policy() {
    let bad = r#"
version: 1
seed:
  policies:
    - { name: "default", daily_limit: 500000 }
    - { name: "platform-default", daily_limit: 100000 }
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("without role and tier"), "{err}");
}

#[test]
fn bundled_dev_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../sponsorgate.yaml");
    let cfg = config::load_from_file(path).expect("dev config must load");
    assert!(!cfg.seed.wallets.is_empty());
}
