//! Sponsorship request vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sponsorgate_core::error::{Result, SponsorError};
use sponsorgate_core::protocol::SponsorRequest;

use vector_loader::load;

fn parse(raw: &str) -> Result<SponsorRequest> {
    let mut req: SponsorRequest = serde_json::from_str(raw)
        .map_err(|e| SponsorError::BadRequest(format!("invalid request json: {e}")))?;
    req.normalize();
    req.validate()?;
    Ok(req)
}

#[test]
fn request_vectors() {
    let files = [
        "request_min.json",
        "request_full.json",
        "request_unknown_field.json",
        "request_missing_payload.json",
        "request_blank_wallet.json",
        "request_metadata_not_object.json",
        "request_padded_identifiers.json",
    ];

    for f in files {
        let v = load(f);
        let raw = serde_json::to_string(&v.request).unwrap();
        let res = parse(&raw);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let req = res.expect("expected ok request");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(req.category, ex["category"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(req.batch_id.as_deref(), ex["batchId"].as_str(), "vector={}", v.description);
        assert_eq!(req.estimated_cost, ex["estimatedCost"].as_u64(), "vector={}", v.description);
        if let Some(op) = ex.get("operation").and_then(|o| o.as_str()) {
            assert_eq!(req.operation, op, "vector={}", v.description);
        }
        if let Some(wallet) = ex.get("walletAddress").and_then(|w| w.as_str()) {
            assert_eq!(req.wallet_address, wallet, "vector={}", v.description);
        }
    }
}

#[test]
fn payload_is_forwarded_verbatim() {
    let v = load("request_full.json");
    let raw = serde_json::to_string(&v.request).unwrap();
    let req = parse(&raw).unwrap();
    let payload: serde_json::Value = serde_json::from_str(req.validate().unwrap().get()).unwrap();
    assert_eq!(payload["sku"], "A-1");
    assert_eq!(payload["qty"], 4);
}
