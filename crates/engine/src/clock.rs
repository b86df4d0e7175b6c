use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of transport time, in seconds. Must be monotonic.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> f64;
}

/// Seconds elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds_bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(seconds: f64) -> Self {
        let clock = Self::default();
        clock.set(seconds);
        clock
    }

    pub fn set(&self, seconds: f64) {
        self.seconds_bits.store(seconds.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::Acquire))
    }
}
