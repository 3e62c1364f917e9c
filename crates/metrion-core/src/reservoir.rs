//! Reservoir sampling strategies backing the summary metric.
//!
//! A reservoir retains a bounded, statistically representative subset of an
//! unbounded observation stream so quantiles can be estimated at export time.
//! Four strategies are provided behind the [`Reservoir`] trait:
//!
//! - uniform (Vitter's Algorithm R),
//! - exponentially decaying (forward decay, biased towards recent values),
//! - sliding time window (everything observed in the last `window`),
//! - sliding count window (the last `size` values).
//!
//! The reservoir only feeds quantile estimation. Observation count and sum
//! are tracked by the summary itself, outside the reservoir, so downsampling
//! never distorts them.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{MetrionError, Result};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// A bounded sample of an observation stream.
///
/// `insert` is called on every observation with the current clock tick;
/// `snapshot` extracts the retained values. Both take `&mut self`; the
/// owning summary serializes access behind a mutex.
pub trait Reservoir: Send {
    fn insert(&mut self, value: f64, tick: u64);
    fn snapshot(&mut self, tick: u64) -> ReservoirSnapshot;
}

/// Sorted view of a reservoir's retained values.
#[derive(Debug, Clone)]
pub struct ReservoirSnapshot {
    values: Vec<f64>,
}

impl ReservoirSnapshot {
    fn from_values(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        Self { values }
    }

    /// Estimate the `q`-quantile (0 <= q <= 1) by linear interpolation
    /// between the two nearest retained values.
    pub fn quantile(&self, q: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let pos = q * (self.values.len() + 1) as f64;
        let idx = pos.floor() as usize;
        if idx < 1 {
            return self.values[0];
        }
        if idx >= self.values.len() {
            return self.values[self.values.len() - 1];
        }
        let lower = self.values[idx - 1];
        let upper = self.values[idx];
        lower + (pos - idx as f64) * (upper - lower)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Reservoir strategy selected at summary build time.
#[derive(Debug, Clone)]
pub enum ReservoirConfig {
    /// Forward-decay sampling biased towards recent observations. The higher
    /// `alpha`, the stronger the bias.
    ExponentiallyDecaying { size: usize, alpha: f64 },
    /// Keep every observation made in the last `window`.
    SlidingTimeWindow { window: Duration },
    /// Keep the last `size` observations.
    SlidingWindow { size: usize },
    /// Uniform random sample of the whole stream.
    Uniform { size: usize },
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self::ExponentiallyDecaying {
            size: 1028,
            alpha: 0.015,
        }
    }
}

impl ReservoirConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::ExponentiallyDecaying { size, alpha } => {
                if *size == 0 {
                    return Err(MetrionError::InvalidReservoir("size must be > 0".into()));
                }
                if !alpha.is_finite() || *alpha <= 0.0 {
                    return Err(MetrionError::InvalidReservoir(
                        "alpha must be a positive finite number".into(),
                    ));
                }
                Ok(())
            }
            Self::SlidingTimeWindow { window } => {
                if window.is_zero() {
                    return Err(MetrionError::InvalidReservoir("window must be > 0".into()));
                }
                Ok(())
            }
            Self::SlidingWindow { size } | Self::Uniform { size } => {
                if *size == 0 {
                    return Err(MetrionError::InvalidReservoir("size must be > 0".into()));
                }
                Ok(())
            }
        }
    }

    /// Build a reservoir instance. `tick` is the current clock tick, used as
    /// the decay landmark.
    pub(crate) fn build(&self, tick: u64) -> Box<dyn Reservoir> {
        match self {
            Self::ExponentiallyDecaying { size, alpha } => {
                Box::new(ExponentiallyDecayingReservoir::new(*size, *alpha, tick))
            }
            Self::SlidingTimeWindow { window } => {
                Box::new(SlidingTimeWindowReservoir::new(*window))
            }
            Self::SlidingWindow { size } => Box::new(SlidingWindowReservoir::new(*size)),
            Self::Uniform { size } => Box::new(UniformReservoir::new(*size)),
        }
    }
}

/// Vitter's Algorithm R: once full, the i-th observation replaces a random
/// slot with probability `size / i`.
pub struct UniformReservoir {
    size: usize,
    seen: u64,
    values: Vec<f64>,
    rng: SmallRng,
}

impl UniformReservoir {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            seen: 0,
            values: Vec::with_capacity(size),
            rng: SmallRng::from_entropy(),
        }
    }
}

impl Reservoir for UniformReservoir {
    fn insert(&mut self, value: f64, _tick: u64) {
        self.seen += 1;
        if self.values.len() < self.size {
            self.values.push(value);
        } else {
            let slot = self.rng.gen_range(0..self.seen);
            if (slot as usize) < self.size {
                self.values[slot as usize] = value;
            }
        }
    }

    fn snapshot(&mut self, _tick: u64) -> ReservoirSnapshot {
        ReservoirSnapshot::from_values(self.values.clone())
    }
}

struct WeightedSample {
    priority: f64,
    value: f64,
}

impl PartialEq for WeightedSample {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority).is_eq()
    }
}

impl Eq for WeightedSample {}

impl PartialOrd for WeightedSample {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightedSample {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

/// Forward-decay reservoir: each observation gets priority
/// `exp(alpha * age) / u` with `u` uniform in `(0, 1]`, and the `size`
/// highest-priority observations are retained. Because priorities grow
/// exponentially with age relative to the landmark, the landmark is moved
/// forward periodically and existing priorities are rescaled to keep the
/// arithmetic in range.
pub struct ExponentiallyDecayingReservoir {
    size: usize,
    alpha: f64,
    landmark: u64,
    next_rescale: u64,
    samples: BinaryHeap<Reverse<WeightedSample>>,
    rng: SmallRng,
}

/// Rescale hourly.
const RESCALE_INTERVAL_NANOS: u64 = 3_600_000_000_000;

impl ExponentiallyDecayingReservoir {
    pub fn new(size: usize, alpha: f64, tick: u64) -> Self {
        Self {
            size,
            alpha,
            landmark: tick,
            next_rescale: tick.saturating_add(RESCALE_INTERVAL_NANOS),
            samples: BinaryHeap::with_capacity(size + 1),
            rng: SmallRng::from_entropy(),
        }
    }

    fn priority(&mut self, tick: u64) -> f64 {
        let age_secs = tick.saturating_sub(self.landmark) as f64 / NANOS_PER_SEC;
        // 1 - gen() maps [0, 1) to (0, 1], keeping the divisor non-zero.
        let u = 1.0 - self.rng.gen::<f64>();
        (self.alpha * age_secs).exp() / u
    }

    fn maybe_rescale(&mut self, tick: u64) {
        if tick < self.next_rescale {
            return;
        }
        let old_landmark = self.landmark;
        self.landmark = tick;
        self.next_rescale = tick.saturating_add(RESCALE_INTERVAL_NANOS);
        let factor =
            (-self.alpha * (tick.saturating_sub(old_landmark) as f64 / NANOS_PER_SEC)).exp();
        let rescaled = std::mem::take(&mut self.samples)
            .into_iter()
            .map(|Reverse(s)| {
                Reverse(WeightedSample {
                    priority: s.priority * factor,
                    value: s.value,
                })
            })
            .collect();
        self.samples = rescaled;
    }
}

impl Reservoir for ExponentiallyDecayingReservoir {
    fn insert(&mut self, value: f64, tick: u64) {
        self.maybe_rescale(tick);
        let priority = self.priority(tick);
        if self.samples.len() < self.size {
            self.samples.push(Reverse(WeightedSample { priority, value }));
        } else if let Some(Reverse(lowest)) = self.samples.peek() {
            if priority > lowest.priority {
                self.samples.pop();
                self.samples.push(Reverse(WeightedSample { priority, value }));
            }
        }
    }

    fn snapshot(&mut self, tick: u64) -> ReservoirSnapshot {
        self.maybe_rescale(tick);
        ReservoirSnapshot::from_values(self.samples.iter().map(|Reverse(s)| s.value).collect())
    }
}

/// Keeps every observation from the last `window`, dropping older entries on
/// both insert and snapshot.
pub struct SlidingTimeWindowReservoir {
    window: u64,
    samples: VecDeque<(u64, f64)>,
}

impl SlidingTimeWindowReservoir {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.as_nanos() as u64,
            samples: VecDeque::new(),
        }
    }

    fn trim(&mut self, tick: u64) {
        let horizon = tick.saturating_sub(self.window);
        while let Some(&(t, _)) = self.samples.front() {
            if t < horizon {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Reservoir for SlidingTimeWindowReservoir {
    fn insert(&mut self, value: f64, tick: u64) {
        self.trim(tick);
        self.samples.push_back((tick, value));
    }

    fn snapshot(&mut self, tick: u64) -> ReservoirSnapshot {
        self.trim(tick);
        ReservoirSnapshot::from_values(self.samples.iter().map(|&(_, v)| v).collect())
    }
}

/// Ring of the last `size` observations.
pub struct SlidingWindowReservoir {
    capacity: usize,
    next: usize,
    values: Vec<f64>,
}

impl SlidingWindowReservoir {
    pub fn new(size: usize) -> Self {
        Self {
            capacity: size,
            next: 0,
            values: Vec::with_capacity(size),
        }
    }
}

impl Reservoir for SlidingWindowReservoir {
    fn insert(&mut self, value: f64, _tick: u64) {
        if self.values.len() < self.capacity {
            self.values.push(value);
        } else {
            self.values[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    fn snapshot(&mut self, _tick: u64) -> ReservoirSnapshot {
        ReservoirSnapshot::from_values(self.values.clone())
    }
}
