//! Wall-clock abstraction.
//!
//! The freshness window and heartbeat checks are evaluated against `now` on
//! every call, so the clock is injected rather than read globally.

use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u32;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u32 {
        u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX)
    }
}

/// Manually advanced clock for deterministic tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub fn new(now: u32) -> Self {
        Self {
            now: AtomicU32::new(now),
        }
    }

    pub fn new_shared(now: u32) -> Arc<Self> {
        Arc::new(Self::new(now))
    }

    pub fn set(&self, now: u32) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u32) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(1_000);
        clock.advance(60);
        assert_eq!(clock.now(), 1_060);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2023-11-14
        assert!(SystemClock.now() > 1_700_000_000);
    }
}
