//! Command execution shared by the throttle crates.
//!
//! Privileged commands go through the [`Executor`] trait so the traffic control layer can be
//! driven by real processes ([`SystemExecutor`]) or by test doubles.

pub mod command;
/// The [`Executor`] seam and its process-backed implementation.
pub mod executor;

pub use command::{Output, Runner};
pub use executor::{Escalation, Executor, SystemExecutor};
