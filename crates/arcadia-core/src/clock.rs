// ── Time source ──
//
// Every set-once timestamp in the core flows through this trait, so
// tests can pin the clock and assert exact stamps.

use chrono::{DateTime, Utc};

/// Source of "now" for transition timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
