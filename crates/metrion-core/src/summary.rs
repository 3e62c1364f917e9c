//! Summary metric: quantile estimates over a sampled observation stream.
//!
//! The reservoir strategy owns which observations are retained; the summary
//! itself tracks total count and running sum with lock-free primitives so the
//! exported `_count`/`_sum` series reflect every observation, including the
//! ones the reservoir discarded.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::atomics::AtomicF64;
use crate::children::ChildMetricRepo;
use crate::clock::{default_clock, Clock, Timer};
use crate::data::{MetricDataConsumer, SummarySnapshot, SUMMARY_QUANTILES};
use crate::error::Result;
use crate::metric::{CommonBuilder, MetricCommon};
use crate::reservoir::{Reservoir, ReservoirConfig};

use std::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct SummaryCore {
    reservoir: Mutex<Box<dyn Reservoir>>,
    count: AtomicU64,
    sum: AtomicF64,
}

impl SummaryCore {
    fn new(reservoir: Box<dyn Reservoir>) -> Self {
        Self {
            reservoir: Mutex::new(reservoir),
            count: AtomicU64::new(0),
            sum: AtomicF64::default(),
        }
    }

    pub(crate) fn observe(&self, value: f64, tick: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.add(value);
        self.reservoir.lock().insert(value, tick);
    }

    fn snapshot(&self, tick: u64) -> SummarySnapshot {
        let view = self.reservoir.lock().snapshot(tick);
        let quantiles = SUMMARY_QUANTILES
            .iter()
            .map(|&q| (q, view.quantile(q)))
            .collect();
        SummarySnapshot::new(self.count.load(Ordering::Relaxed), self.sum.load(), quantiles)
    }
}

/// A summary metric. Build via [`Summary::builder`].
pub struct Summary {
    common: MetricCommon,
    children: ChildMetricRepo<SummaryCore>,
    clock: Arc<dyn Clock>,
}

impl Summary {
    pub fn builder(name: &str, help: &str) -> SummaryBuilder {
        SummaryBuilder {
            common: CommonBuilder::new(name, help),
            reservoir: ReservoirConfig::default(),
            clock: None,
        }
    }

    pub fn common(&self) -> &MetricCommon {
        &self.common
    }

    /// Record one observation.
    pub fn observe(&self, value: f64, label_values: &[&str]) -> Result<()> {
        self.common.validate_label_values(label_values)?;
        let tick = self.clock.tick();
        self.children
            .state_for_labels(label_values)?
            .observe(value, tick);
        Ok(())
    }

    /// Start a timer whose `stop` observes the elapsed ticks into this
    /// summary.
    pub fn start_timer(&self, label_values: &[&str]) -> Result<Timer<impl FnOnce(f64)>> {
        self.common.validate_label_values(label_values)?;
        let core = self.children.state_for_labels(label_values)?;
        let clock = Arc::clone(&self.clock);
        let tick_clock = Arc::clone(&self.clock);
        Ok(Timer::start(clock, move |elapsed| {
            core.observe(elapsed, tick_clock.tick())
        }))
    }

    /// Current quantile/count/sum view of one child.
    pub fn snapshot(&self, label_values: &[&str]) -> Result<SummarySnapshot> {
        self.common.validate_label_values(label_values)?;
        let tick = self.clock.tick();
        Ok(self.children.state_for_labels(label_values)?.snapshot(tick))
    }

    pub fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) -> Result<()> {
        let tick = self.clock.tick();
        self.children.for_each(|data| {
            let snapshot = data.state().snapshot(tick);
            consumer.consume_summary(&self.common, data.label_values(), &snapshot)
        })
    }
}

/// Configuration for a [`Summary`].
pub struct SummaryBuilder {
    common: CommonBuilder,
    reservoir: ReservoirConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl SummaryBuilder {
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

    /// Select the reservoir strategy (default: exponentially decaying,
    /// size 1028, alpha 0.015).
    pub fn with_reservoir(mut self, reservoir: ReservoirConfig) -> Self {
        self.reservoir = reservoir;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Summary> {
        let common = self.common.build()?;
        self.reservoir.validate()?;
        let clock = self.clock.unwrap_or_else(default_clock);
        let config = self.reservoir;

        let children = if common.label_names().is_empty() {
            let reservoir = config.build(clock.tick());
            ChildMetricRepo::unlabeled(SummaryCore::new(reservoir))
        } else {
            let factory_clock = Arc::clone(&clock);
            ChildMetricRepo::labeled(move || {
                SummaryCore::new(config.build(factory_clock.tick()))
            })
        };
        Ok(Summary {
            common,
            children,
            clock,
        })
    }
}
