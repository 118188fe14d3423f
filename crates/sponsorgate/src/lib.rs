//! Top-level facade crate for sponsorgate.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use sponsorgate_core::*;
}

pub mod gateway {
    pub use sponsorgate_gateway::*;
}
