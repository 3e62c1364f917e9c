//! Lock-free float accumulation over atomic bit patterns.

use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` cell with atomic load/store and CAS-based add.
///
/// Backs every float accumulator in the crate (histogram sums, summary sums,
/// gauge values). Writers never block each other; a failed CAS retries with
/// the fresh value.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn add(&self, delta: f64) {
        loop {
            let current = self.bits.load(Ordering::Relaxed);
            let next = (f64::from_bits(current) + delta).to_bits();
            if self
                .bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }
        }
    }
}
