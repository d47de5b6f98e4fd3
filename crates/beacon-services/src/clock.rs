//! Time source abstraction for retention checks.
//!
//! Expiry is driven by an injected clock so tests advance time instead of
//! sleeping. Production code uses [`SystemClock`].

use std::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
