//! Pull gauge: values computed by caller-supplied functions.
//!
//! Each label combination is bound to one supplier at build time; the child
//! set is fixed and lookups for unconfigured combinations fail. Supplier
//! results are cached for a TTL so expensive suppliers (process stats and the
//! like) are not recomputed on every scrape. Cache refresh tolerates races:
//! two threads may both recompute, the last writer wins, and both observe a
//! value that was true during the call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::atomics::AtomicF64;
use crate::children::ChildMetricRepo;
use crate::clock::{default_clock, Clock};
use crate::data::MetricDataConsumer;
use crate::error::{MetrionError, Result};
use crate::metric::{CommonBuilder, MetricCommon};

/// Default supplier cache TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

type ValueSupplier = Box<dyn Fn() -> f64 + Send + Sync>;

/// Never-loaded sentinel for `loaded_at`.
const NEVER: u64 = u64::MAX;

pub(crate) struct GaugeCore {
    supplier: ValueSupplier,
    ttl: u64,
    clock: Arc<dyn Clock>,
    cached: AtomicF64,
    loaded_at: AtomicU64,
}

impl GaugeCore {
    fn new(supplier: ValueSupplier, ttl: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            supplier,
            ttl,
            clock,
            cached: AtomicF64::default(),
            loaded_at: AtomicU64::new(NEVER),
        }
    }

    fn value(&self) -> f64 {
        let now = self.clock.tick();
        let loaded_at = self.loaded_at.load(Ordering::Relaxed);
        if loaded_at == NEVER || now.saturating_sub(loaded_at) >= self.ttl {
            let value = (self.supplier)();
            self.cached.store(value);
            self.loaded_at.store(now, Ordering::Relaxed);
            return value;
        }
        self.cached.load()
    }
}

/// A pull gauge metric. Build via [`Gauge::builder`].
pub struct Gauge {
    common: MetricCommon,
    children: ChildMetricRepo<GaugeCore>,
}

impl Gauge {
    pub fn builder(name: &str, help: &str) -> GaugeBuilder {
        GaugeBuilder {
            common: CommonBuilder::new(name, help),
            suppliers: Vec::new(),
            ttl: DEFAULT_CACHE_TTL,
            clock: None,
        }
    }

    pub fn common(&self) -> &MetricCommon {
        &self.common
    }

    /// Current (possibly cached) value for the given label combination.
    /// Fails for combinations no supplier was configured for.
    pub fn value(&self, label_values: &[&str]) -> Result<f64> {
        self.common.validate_label_values(label_values)?;
        self.children
            .get(label_values)
            .map(|core| core.value())
            .ok_or(MetrionError::UnknownLabels)
    }

    pub fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) -> Result<()> {
        self.children.for_each(|data| {
            consumer.consume_gauge(&self.common, data.label_values(), data.state().value())
        })
    }
}

/// Configuration for a [`Gauge`]: one value supplier per label combination.
pub struct GaugeBuilder {
    common: CommonBuilder,
    suppliers: Vec<(Vec<String>, ValueSupplier)>,
    ttl: Duration,
    clock: Option<Arc<dyn Clock>>,
}

impl GaugeBuilder {
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

    /// Bind `supplier` to one label-value combination. A gauge without labels
    /// takes exactly one supplier with an empty combination.
    pub fn with_value_supplier(
        mut self,
        supplier: impl Fn() -> f64 + Send + Sync + 'static,
        label_values: &[&str],
    ) -> Self {
        self.suppliers.push((
            label_values.iter().map(|v| v.to_string()).collect(),
            Box::new(supplier),
        ));
        self
    }

    /// Override the supplier cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Gauge> {
        let common = self.common.build()?;
        if self.suppliers.is_empty() {
            return Err(MetrionError::InvalidGauge(
                "at least one value supplier is required".into(),
            ));
        }
        let arity = common.label_names().len();
        for (label_values, _) in &self.suppliers {
            if label_values.len() != arity {
                return Err(MetrionError::LabelCardinality {
                    expected: arity,
                    actual: label_values.len(),
                });
            }
        }
        for (i, (label_values, _)) in self.suppliers.iter().enumerate() {
            if self.suppliers[..i].iter().any(|(seen, _)| seen == label_values) {
                return Err(MetrionError::InvalidGauge(format!(
                    "duplicate supplier for label values {label_values:?}"
                )));
            }
        }

        let clock = self.clock.unwrap_or_else(default_clock);
        let ttl = self.ttl.as_nanos() as u64;
        let mut cores = self.suppliers.into_iter().map(|(label_values, supplier)| {
            (
                label_values,
                GaugeCore::new(supplier, ttl, Arc::clone(&clock)),
            )
        });

        let children = if arity == 0 {
            // is_empty() was checked above, so exactly one supplier exists.
            match cores.next() {
                Some((_, core)) => ChildMetricRepo::unlabeled(core),
                None => return Err(MetrionError::InvalidGauge("no supplier".into())),
            }
        } else {
            ChildMetricRepo::prepopulated(cores)
        };
        Ok(Gauge { common, children })
    }
}
