//! The metric sum type and the identity shared by all metric kinds.

use crate::counter::Counter;
use crate::data::{MetricDataConsumer, MetricKind};
use crate::error::{MetrionError, Result};
use crate::gauge::Gauge;
use crate::histogram::Histogram;
use crate::label::{validate_label_name, validate_metric_name};
use crate::settable_gauge::SettableGauge;
use crate::summary::Summary;

/// Name, help, and label schema of a metric. Fixed at build time.
#[derive(Debug)]
pub struct MetricCommon {
    name: String,
    help: String,
    label_names: Vec<String>,
}

impl MetricCommon {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Arity check done on every observation call, before any state mutation.
    pub(crate) fn validate_label_values(&self, label_values: &[&str]) -> Result<()> {
        if label_values.len() != self.label_names.len() {
            return Err(MetrionError::LabelCardinality {
                expected: self.label_names.len(),
                actual: label_values.len(),
            });
        }
        Ok(())
    }
}

/// Name/help/namespace/subsystem/labels plumbing shared by every builder.
///
/// The full metric name is `namespace_subsystem_name` with blank parts
/// skipped; grammar validation runs once on the assembled name.
pub(crate) struct CommonBuilder {
    name: String,
    help: String,
    namespace: String,
    subsystem: String,
    pub(crate) label_names: Vec<String>,
}

impl CommonBuilder {
    pub(crate) fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            namespace: String::new(),
            subsystem: String::new(),
            label_names: Vec::new(),
        }
    }

    pub(crate) fn set_namespace(&mut self, namespace: &str) {
        self.namespace = namespace.to_string();
    }

    pub(crate) fn set_subsystem(&mut self, subsystem: &str) {
        self.subsystem = subsystem.to_string();
    }

    pub(crate) fn set_labels(&mut self, label_names: &[&str]) {
        self.label_names = label_names.iter().map(|n| n.to_string()).collect();
    }

    pub(crate) fn build(self) -> Result<MetricCommon> {
        if self.help.trim().is_empty() {
            return Err(MetrionError::BlankHelp);
        }
        let mut full_name = String::new();
        for part in [&self.namespace, &self.subsystem] {
            if !part.is_empty() {
                full_name.push_str(part);
                full_name.push('_');
            }
        }
        full_name.push_str(&self.name);
        validate_metric_name(&full_name)?;
        for label_name in &self.label_names {
            validate_label_name(label_name)?;
        }
        Ok(MetricCommon {
            name: full_name,
            help: self.help,
            label_names: self.label_names,
        })
    }
}

/// A registered metric. Closed over the five concrete kinds; exporters match
/// on [`Metric::kind`] and per-kind sample shapes stay in the export crate.
pub enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    SettableGauge(SettableGauge),
    Histogram(Histogram),
    Summary(Summary),
}

impl Metric {
    pub fn common(&self) -> &MetricCommon {
        match self {
            Metric::Counter(m) => m.common(),
            Metric::Gauge(m) => m.common(),
            Metric::SettableGauge(m) => m.common(),
            Metric::Histogram(m) => m.common(),
            Metric::Summary(m) => m.common(),
        }
    }

    pub fn name(&self) -> &str {
        self.common().name()
    }

    pub fn help(&self) -> &str {
        self.common().help()
    }

    pub fn label_names(&self) -> &[String] {
        self.common().label_names()
    }

    /// Wire kind; both gauge variants export as `gauge`.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) | Metric::SettableGauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Summary(_) => MetricKind::Summary,
        }
    }

    /// Push-iterate every child's current state into `consumer`.
    pub fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) -> Result<()> {
        match self {
            Metric::Counter(m) => m.for_each_metric_data(consumer),
            Metric::Gauge(m) => m.for_each_metric_data(consumer),
            Metric::SettableGauge(m) => m.for_each_metric_data(consumer),
            Metric::Histogram(m) => m.for_each_metric_data(consumer),
            Metric::Summary(m) => m.for_each_metric_data(consumer),
        }
    }

    /// True when `other` could share this metric's registration slot: same
    /// kind and same label-name schema.
    pub fn schema_matches(&self, other: &Metric) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && self.label_names() == other.label_names()
    }

    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            Metric::Counter(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&Gauge> {
        match self {
            Metric::Gauge(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_settable_gauge(&self) -> Option<&SettableGauge> {
        match self {
            Metric::SettableGauge(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            Metric::Histogram(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_summary(&self) -> Option<&Summary> {
        match self {
            Metric::Summary(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Counter> for Metric {
    fn from(m: Counter) -> Self {
        Metric::Counter(m)
    }
}

impl From<Gauge> for Metric {
    fn from(m: Gauge) -> Self {
        Metric::Gauge(m)
    }
}

impl From<SettableGauge> for Metric {
    fn from(m: SettableGauge) -> Self {
        Metric::SettableGauge(m)
    }
}

impl From<Histogram> for Metric {
    fn from(m: Histogram) -> Self {
        Metric::Histogram(m)
    }
}

impl From<Summary> for Metric {
    fn from(m: Summary) -> Self {
        Metric::Summary(m)
    }
}
