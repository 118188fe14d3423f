//! Wire contracts (JSON over HTTP).
//!
//! - Inbound: `SponsorRequest`, strict (`deny_unknown_fields`), with the
//!   operation payload kept as `RawValue` so it is forwarded to the relay
//!   without being re-parsed.
//! - Outbound: accepted/rejected sponsorship bodies and admin views.
//!
//! Field names are camelCase on the wire.

pub mod admin;
pub mod request;
pub mod response;

pub use admin::{GasStats, SponsorshipToggle, TopSpender};
pub use request::SponsorRequest;
pub use response::{SponsorAccepted, SponsorRejected};
