//! Domain models for Rollcall.

pub mod attendance;
pub mod session;
