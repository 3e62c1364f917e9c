//! Counter metric: a monotonically accumulating value per label combination.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::children::ChildMetricRepo;
use crate::data::MetricDataConsumer;
use crate::error::Result;
use crate::metric::{CommonBuilder, MetricCommon};

/// Per-child accumulator. Plain lock-free add; negative amounts are accepted
/// by the primitive. The counter contract is intended-monotonic and callers
/// own that invariant.
#[derive(Debug, Default)]
pub(crate) struct CounterCore {
    value: AtomicI64,
}

impl CounterCore {
    fn inc(&self, amount: i64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A counter metric. Build via [`Counter::builder`].
pub struct Counter {
    common: MetricCommon,
    children: ChildMetricRepo<CounterCore>,
}

impl Counter {
    pub fn builder(name: &str, help: &str) -> CounterBuilder {
        CounterBuilder {
            common: CommonBuilder::new(name, help),
        }
    }

    pub fn common(&self) -> &MetricCommon {
        &self.common
    }

    /// Increment by 1.
    pub fn inc(&self, label_values: &[&str]) -> Result<()> {
        self.inc_by(1, label_values)
    }

    /// Increment by an arbitrary amount.
    pub fn inc_by(&self, amount: i64, label_values: &[&str]) -> Result<()> {
        self.common.validate_label_values(label_values)?;
        self.children.state_for_labels(label_values)?.inc(amount);
        Ok(())
    }

    /// Current accumulated value for the given label combination.
    pub fn value(&self, label_values: &[&str]) -> Result<i64> {
        self.common.validate_label_values(label_values)?;
        Ok(self.children.state_for_labels(label_values)?.value())
    }

    pub fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) -> Result<()> {
        self.children.for_each(|data| {
            consumer.consume_counter(&self.common, data.label_values(), data.state().value() as f64)
        })
    }
}

/// Configuration for a [`Counter`].
pub struct CounterBuilder {
    common: CommonBuilder,
}

impl CounterBuilder {
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

    pub fn build(self) -> Result<Counter> {
        let common = self.common.build()?;
        let children = if common.label_names().is_empty() {
            ChildMetricRepo::unlabeled(CounterCore::default())
        } else {
            ChildMetricRepo::labeled(CounterCore::default)
        };
        Ok(Counter { common, children })
    }
}
