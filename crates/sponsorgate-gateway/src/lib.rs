//! sponsorgate gateway library entry.
//!
//! Wires the operation gate, policy resolver, quota ledger, platform cap
//! guard, transaction auditor, and ledger sync queue into the admission
//! gateway, and exposes it over HTTP. Consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod admission;
pub mod app_state;
pub mod audit;
pub mod clock;
pub mod config;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod quota;
pub mod relay;
pub mod router;
pub mod store;
pub mod sync;
pub mod transport;
