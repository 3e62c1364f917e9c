//! Metric registry: name-keyed container walked by the exporters.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{MetrionError, Result};
use crate::label::validate_label_name;
use crate::metric::Metric;

/// Long-lived container mapping metric names to registered metrics.
///
/// Registration is get-or-register: the first registration under a name wins;
/// a later registration with a matching kind and label schema returns the
/// existing instance, and a conflicting one fails immediately. Iteration is
/// weakly consistent: safe concurrent with registration, but a metric
/// registered mid-walk may or may not be visited in that pass.
pub struct MetricRegistry {
    metrics: DashMap<String, Arc<Metric>>,
    static_labels: Vec<(String, String)>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            metrics: DashMap::new(),
            static_labels: Vec::new(),
        }
    }

    /// Registry whose exported samples all carry the given constant labels,
    /// placed before each metric's own labels.
    pub fn with_static_labels(static_labels: Vec<(String, String)>) -> Result<Self> {
        for (name, _) in &static_labels {
            validate_label_name(name)?;
        }
        Ok(Self {
            metrics: DashMap::new(),
            static_labels,
        })
    }

    /// Register `metric`, or return the metric already registered under the
    /// same name if its schema matches.
    pub fn get_or_register(&self, metric: impl Into<Metric>) -> Result<Arc<Metric>> {
        let metric = metric.into();
        match self.metrics.entry(metric.name().to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if existing.schema_matches(&metric) {
                    Ok(Arc::clone(existing))
                } else {
                    tracing::warn!(
                        metric = metric.name(),
                        "rejected registration with conflicting schema"
                    );
                    Err(MetrionError::AlreadyRegistered(metric.name().to_string()))
                }
            }
            Entry::Vacant(slot) => {
                tracing::debug!(metric = metric.name(), "metric registered");
                let metric = Arc::new(metric);
                slot.insert(Arc::clone(&metric));
                Ok(metric)
            }
        }
    }

    /// Remove `metric` if this exact instance is the one registered under its
    /// name. Returns whether anything was removed.
    pub fn deregister(&self, metric: &Arc<Metric>) -> bool {
        let removed = self
            .metrics
            .remove_if(metric.name(), |_, existing| Arc::ptr_eq(existing, metric))
            .is_some();
        if removed {
            tracing::debug!(metric = metric.name(), "metric deregistered");
        }
        removed
    }

    /// Metric registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<Metric>> {
        self.metrics.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Visit every registered metric (weakly consistent).
    pub fn for_each_metric<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&Metric) -> Result<()>,
    {
        for entry in self.metrics.iter() {
            f(entry.value())?;
        }
        Ok(())
    }

    pub fn static_labels(&self) -> &[(String, String)] {
        &self.static_labels
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}
