//! Enrollment ledger for capacity-limited programs.
//!
//! Registrants are admitted while a program has open seats and waitlisted otherwise.
//! Withdrawing an enrolled registrant promotes the longest-waiting registrant of the
//! same program.

pub mod config;
pub mod error;
pub mod registration;
pub mod telemetry;
