//! Absolute-instant countdowns for resend cooldowns, lockouts and rate-limit
//! backoff.
//!
//! A countdown is never decremented. Callers keep the expiry instant (in
//! memory or in durable storage) and recompute the remaining time on every
//! poll, so a reload reconstructs the same value without drift.

mod clock;
mod timer;


pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use timer::{clamp_hold, format_remaining, Countdown, MAX_HOLD_SECONDS};
