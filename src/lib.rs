//! comic-back database bootstrap.
//!
//! Holds the fixed layout the bootstrap writes on a fresh data volume and a
//! read-only verification of that layout.

pub mod plan;
pub mod verify;

pub use plan::Plan;
pub use verify::{verify, Check, Outcome, VerifyReport};
