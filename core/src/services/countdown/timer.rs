//! Restartable countdown over absolute expiry instants

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::clock::TimeSource;

/// Longest hold a countdown will represent (one day)
pub const MAX_HOLD_SECONDS: i64 = 24 * 60 * 60;

/// Clamp a requested duration into `0..=MAX_HOLD_SECONDS`
pub fn clamp_hold(seconds: i64) -> i64 {
    seconds.clamp(0, MAX_HOLD_SECONDS)
}

/// Countdown helper bound to a time source
#[derive(Clone)]
pub struct Countdown {
    clock: Arc<dyn TimeSource>,
}

impl Countdown {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self { clock }
    }

    /// Current instant according to the bound time source
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Expiry instant `duration_seconds` from now, clamped to
    /// [`MAX_HOLD_SECONDS`]
    pub fn start(&self, duration_seconds: i64) -> DateTime<Utc> {
        let now = self.clock.now();
        Duration::try_seconds(clamp_hold(duration_seconds))
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(now)
    }

    /// Whole seconds until `expiry`, rounded up, never negative
    pub fn remaining(&self, expiry: DateTime<Utc>) -> i64 {
        let millis = (expiry - self.clock.now()).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis + 999) / 1000
        }
    }

    /// Like [`remaining`](Self::remaining) for an optional expiry
    pub fn remaining_opt(&self, expiry: Option<DateTime<Utc>>) -> i64 {
        expiry.map(|e| self.remaining(e)).unwrap_or(0)
    }

    pub fn is_elapsed(&self, expiry: DateTime<Utc>) -> bool {
        self.remaining(expiry) == 0
    }

    /// Expiry is set and not yet reached
    pub fn is_active(&self, expiry: Option<DateTime<Utc>>) -> bool {
        self.remaining_opt(expiry) > 0
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown").field("now", &self.clock.now()).finish()
    }
}

/// Render seconds as `m:ss`
pub fn format_remaining(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
