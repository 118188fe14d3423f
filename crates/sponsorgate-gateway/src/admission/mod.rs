//! Admission pipeline (the sponsorship gateway) and its request stages.

pub mod gateway;
pub mod stage;

pub use gateway::{Collaborators, Rejection, Sponsored, SponsorshipGateway, SponsorshipOutcome};
pub use stage::Stage;
