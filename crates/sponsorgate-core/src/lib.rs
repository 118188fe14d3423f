//! sponsorgate core: data model, wire contracts, and the rejection surface.
//!
//! This crate defines the types shared by the admission gateway, its storage
//! collaborators, and client tooling. It carries no transport or runtime
//! dependencies so it can be reused by SDKs and offline tools.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `SponsorError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod protocol;

/// Shared result type.
pub use error::{RejectCode, Result, SponsorError};
