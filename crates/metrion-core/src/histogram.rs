//! Bucketed histogram metric.
//!
//! A write increments exactly one bucket, the first whose bound is `>=` the
//! observed value, plus the running sum. Cumulative counts are only computed
//! at read time, so the write path stays O(bucket count) with no locking.
//! The bound scan is linear; bucket sets are small.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::atomics::AtomicF64;
use crate::children::ChildMetricRepo;
use crate::clock::{default_clock, Clock, Timer};
use crate::data::{HistogramSnapshot, MetricDataConsumer};
use crate::error::{MetrionError, Result};
use crate::metric::{CommonBuilder, MetricCommon};

/// Default bucket upper bounds (seconds-flavored, matching common latency
/// instrumentation).
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Per-child bucket state. `bounds` always ends with `+Inf`, so every value
/// lands in some bucket.
pub(crate) struct BucketsCore {
    bounds: Arc<[f64]>,
    counts: Box<[AtomicU64]>,
    sum: AtomicF64,
}

impl BucketsCore {
    fn new(bounds: Arc<[f64]>) -> Self {
        let counts = bounds.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            counts,
            sum: AtomicF64::default(),
        }
    }

    pub(crate) fn observe(&self, value: f64) {
        for (i, bound) in self.bounds.iter().enumerate() {
            if value <= *bound {
                self.counts[i].fetch_add(1, Ordering::Relaxed);
                break;
            }
        }
        self.sum.add(value);
    }

    /// Snapshot the sum first, then accumulate the per-bucket counts into
    /// cumulative values, so additions racing with the accumulation cannot
    /// push the exported sum ahead of the exported count.
    fn snapshot(&self) -> HistogramSnapshot {
        let sum = self.sum.load();
        let mut cumulative = Vec::with_capacity(self.counts.len());
        let mut acc = 0u64;
        for count in self.counts.iter() {
            acc += count.load(Ordering::Relaxed);
            cumulative.push(acc);
        }
        HistogramSnapshot::new(self.bounds.to_vec(), cumulative, sum)
    }
}

/// A histogram metric. Build via [`Histogram::builder`].
pub struct Histogram {
    common: MetricCommon,
    children: ChildMetricRepo<BucketsCore>,
    clock: Arc<dyn Clock>,
}

impl Histogram {
    pub fn builder(name: &str, help: &str) -> HistogramBuilder {
        HistogramBuilder {
            common: CommonBuilder::new(name, help),
            buckets: DEFAULT_BUCKETS.to_vec(),
            clock: None,
        }
    }

    pub fn common(&self) -> &MetricCommon {
        &self.common
    }

    /// Record one observation.
    pub fn observe(&self, value: f64, label_values: &[&str]) -> Result<()> {
        self.common.validate_label_values(label_values)?;
        self.children.state_for_labels(label_values)?.observe(value);
        Ok(())
    }

    /// Start a timer whose `stop` observes the elapsed ticks into this
    /// histogram.
    pub fn start_timer(&self, label_values: &[&str]) -> Result<Timer<impl FnOnce(f64)>> {
        self.common.validate_label_values(label_values)?;
        let core = self.children.state_for_labels(label_values)?;
        Ok(Timer::start(Arc::clone(&self.clock), move |elapsed| {
            core.observe(elapsed)
        }))
    }

    /// Current cumulative view of one child.
    pub fn snapshot(&self, label_values: &[&str]) -> Result<HistogramSnapshot> {
        self.common.validate_label_values(label_values)?;
        Ok(self.children.state_for_labels(label_values)?.snapshot())
    }

    pub fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) -> Result<()> {
        self.children.for_each(|data| {
            let snapshot = data.state().snapshot();
            consumer.consume_histogram(&self.common, data.label_values(), &snapshot)
        })
    }
}

/// Configuration for a [`Histogram`].
pub struct HistogramBuilder {
    common: CommonBuilder,
    buckets: Vec<f64>,
    clock: Option<Arc<dyn Clock>>,
}

impl HistogramBuilder {
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.common.set_namespace(namespace);
        self
    }

    pub fn with_subsystem(mut self, subsystem: &str) -> Self {
        self.common.set_subsystem(subsystem);
        self
    }

    pub fn with_labels(mut self, label_names: &[&str]) -> Self {
        self.common.set_labels(label_names);
        self
    }

    /// Replace the bucket upper bounds. `+Inf` is appended automatically and
    /// must not be supplied.
    pub fn with_buckets(mut self, buckets: &[f64]) -> Self {
        self.buckets = buckets.to_vec();
        self
    }

    /// Generate `count` equal-width buckets starting at `start`.
    pub fn with_equal_width_buckets(mut self, start: f64, width: f64, count: usize) -> Self {
        self.buckets = (0..count).map(|i| start + width * i as f64).collect();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Histogram> {
        let common = self.common.build()?;
        for bound in &self.buckets {
            if !bound.is_finite() {
                return Err(MetrionError::InvalidBuckets(
                    "NaN and infinite bucket bounds are not allowed".into(),
                ));
            }
        }
        if self.buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(MetrionError::InvalidBuckets(
                "bucket bounds must be strictly ascending".into(),
            ));
        }

        let mut bounds = self.buckets;
        bounds.push(f64::INFINITY);
        let bounds: Arc<[f64]> = bounds.into();

        let children = if common.label_names().is_empty() {
            ChildMetricRepo::unlabeled(BucketsCore::new(Arc::clone(&bounds)))
        } else {
            ChildMetricRepo::labeled(move || BucketsCore::new(Arc::clone(&bounds)))
        };
        Ok(Histogram {
            common,
            children,
            clock: self.clock.unwrap_or_else(default_clock),
        })
    }
}
