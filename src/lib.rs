//! Ambience Engine — deterministic scheduling of ambient creature audio.
//!
//! Generates a time-ordered log of roar and creak events whose level,
//! pitch and spacing follow a time-varying intensity signal. Tuning is
//! loaded once up front; the same seed always yields the same log.

pub mod core;
pub mod schema;
