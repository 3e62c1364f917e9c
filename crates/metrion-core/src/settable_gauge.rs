//! Settable gauge: a value pushed from application code.
//!
//! Unlike the pull [`crate::gauge::Gauge`], consecutive `set` calls do not
//! all show up when sampling: the last value written wins.

use std::sync::Arc;

use crate::atomics::AtomicF64;
use crate::children::ChildMetricRepo;
use crate::data::MetricDataConsumer;
use crate::error::Result;
use crate::metric::{CommonBuilder, MetricCommon};

#[derive(Debug, Default)]
pub(crate) struct SettableCore {
    value: AtomicF64,
}

/// A push gauge metric. Build via [`SettableGauge::builder`].
pub struct SettableGauge {
    common: MetricCommon,
    children: ChildMetricRepo<SettableCore>,
}

impl SettableGauge {
    pub fn builder(name: &str, help: &str) -> SettableGaugeBuilder {
        SettableGaugeBuilder {
            common: CommonBuilder::new(name, help),
        }
    }

    pub fn common(&self) -> &MetricCommon {
        &self.common
    }

    /// Set the gauge for the given label combination. Last write wins.
    pub fn set(&self, value: f64, label_values: &[&str]) -> Result<()> {
        self.common.validate_label_values(label_values)?;
        self.children
            .state_for_labels(label_values)?
            .value
            .store(value);
        Ok(())
    }

    /// Current value; 0.0 for a combination that was never set.
    pub fn value(&self, label_values: &[&str]) -> Result<f64> {
        self.common.validate_label_values(label_values)?;
        let core: Arc<SettableCore> = self.children.state_for_labels(label_values)?;
        Ok(core.value.load())
    }

    pub fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) -> Result<()> {
        self.children.for_each(|data| {
            consumer.consume_gauge(&self.common, data.label_values(), data.state().value.load())
        })
    }
}

/// Configuration for a [`SettableGauge`].
pub struct SettableGaugeBuilder {
    common: CommonBuilder,
}

impl SettableGaugeBuilder {
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

    pub fn build(self) -> Result<SettableGauge> {
        let common = self.common.build()?;
        let children = if common.label_names().is_empty() {
            ChildMetricRepo::unlabeled(SettableCore::default())
        } else {
            ChildMetricRepo::labeled(SettableCore::default)
        };
        Ok(SettableGauge { common, children })
    }
}
