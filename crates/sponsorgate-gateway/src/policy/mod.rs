//! Policy layer (spending policy resolution, operation gate).
//!
//! The gate compiles its rule strings once at startup into lookup structures;
//! the resolver reads the policy store on every admission.

pub mod gate;
pub mod resolver;

pub use gate::OperationGate;
pub use resolver::{PolicyMatch, PolicyResolver, Resolution};
