//! Downstream clearance trigger.
//!
//! On a positive listing verdict the gate authenticates against the
//! case-management service (credential exchange for a bearer token) and posts
//! a clearance request for the listing. The whole path is fail-open from the
//! caller's perspective: classification correctness decides the HTTP response,
//! notification failures are logged and recorded in a [`ClearanceOutcome`]
//! only.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::ClearanceClient;
pub use config::{ClearanceConfig, LISTING_ID_PLACEHOLDER};
pub use error::ClearanceError;
pub use types::{ClearanceOutcome, ClearanceState};
