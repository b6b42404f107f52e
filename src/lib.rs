//! Terminal client for a user-management REST service.
//!
//! The interesting part lives in [`core`]: raw HTTP lifecycle events are
//! folded into a uniform [`core::status::StatusInfo`] and broadcast on a
//! process-wide replay-latest hub so any number of consumers can observe the
//! latest operation status without polling.

pub mod cli;
pub mod core;
