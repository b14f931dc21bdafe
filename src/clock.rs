//! Time sources
//!
//! The session never reads time itself; drivers pass milliseconds from a
//! [`Clock`]. Native runs use a monotonic [`SystemClock`], tests and replays
//! use [`ManualClock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since construction, from `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    startup: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            startup: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.startup.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) -> u64 {
        self.now.fetch_add(ms, Ordering::SeqCst) + ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
