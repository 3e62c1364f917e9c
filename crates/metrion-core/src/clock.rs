//! Tick sources and the single-use interval timer.
//!
//! All timed observations (histogram/summary timers, gauge cache TTLs,
//! reservoir decay) go through the [`Clock`] trait so tests can drive time
//! deterministically with [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic tick source. Ticks are nanoseconds from an arbitrary fixed
/// origin; only differences between ticks are meaningful.
pub trait Clock: Send + Sync {
    fn tick(&self) -> u64;
}

/// Default clock: nanoseconds elapsed since the clock was created.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn tick(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// Hand-driven clock for deterministic tests.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `nanos`.
    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Set the clock to an absolute tick.
    pub fn set(&self, nanos: u64) {
        self.now.store(nanos, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn tick(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

pub(crate) fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock::new())
}

/// Single-use interval timer.
///
/// Created with a start tick; [`Timer::stop`] takes a second tick and feeds
/// the elapsed delta into the owning metric. Consuming `self` makes a double
/// stop impossible.
pub struct Timer<F: FnOnce(f64)> {
    clock: Arc<dyn Clock>,
    start: u64,
    observe: F,
}

impl<F: FnOnce(f64)> Timer<F> {
    pub(crate) fn start(clock: Arc<dyn Clock>, observe: F) -> Self {
        let start = clock.tick();
        Self {
            clock,
            start,
            observe,
        }
    }

    /// Stop the timer and record the elapsed ticks.
    pub fn stop(self) {
        let elapsed = self.clock.tick().saturating_sub(self.start);
        (self.observe)(elapsed as f64);
    }

    /// Elapsed ticks without stopping.
    pub fn elapsed(&self) -> u64 {
        self.clock.tick().saturating_sub(self.start)
    }
}
