//! Snapshot data contracts handed to exporters.
//!
//! Exporters never see aggregator internals; they receive immutable snapshot
//! values through [`MetricDataConsumer`], one callback per child. How many
//! wire samples a snapshot expands into is the exporter's business.

use serde::Serialize;

use crate::error::Result;
use crate::metric::MetricCommon;

/// Wire-level metric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Summary,
    Histogram,
}

impl MetricKind {
    /// Name used in the `# TYPE` exposition header.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Summary => "summary",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// The fixed quantiles every summary exports.
pub const SUMMARY_QUANTILES: [f64; 6] = [0.5, 0.75, 0.95, 0.98, 0.99, 0.999];

/// Point-in-time view of one histogram child.
///
/// Bucket counts are cumulative: entry `i` counts every observation `<=
/// bounds[i]`. The last bound is always `+Inf`, so the last count equals the
/// total observation count. The sum is snapshotted before the counts are
/// accumulated; a small skew between the two under concurrent writes is
/// accepted.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    bounds: Vec<f64>,
    cumulative: Vec<u64>,
    sum: f64,
}

impl HistogramSnapshot {
    pub(crate) fn new(bounds: Vec<f64>, cumulative: Vec<u64>, sum: f64) -> Self {
        Self {
            bounds,
            cumulative,
            sum,
        }
    }

    /// Total number of observations.
    pub fn count(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Sum of all observed values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// `(upper_bound, cumulative_count)` pairs in ascending bound order,
    /// ending with the `+Inf` bucket.
    pub fn buckets(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.bounds
            .iter()
            .copied()
            .zip(self.cumulative.iter().copied())
    }
}

/// Point-in-time view of one summary child: quantile estimates from the
/// reservoir plus the independently tracked count and sum.
#[derive(Debug, Clone, Serialize)]
pub struct SummarySnapshot {
    count: u64,
    sum: f64,
    quantiles: Vec<(f64, f64)>,
}

impl SummarySnapshot {
    pub(crate) fn new(count: u64, sum: f64, quantiles: Vec<(f64, f64)>) -> Self {
        Self {
            count,
            sum,
            quantiles,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// `(quantile, estimate)` pairs in [`SUMMARY_QUANTILES`] order.
    pub fn quantiles(&self) -> &[(f64, f64)] {
        &self.quantiles
    }
}

/// Push visitor over a metric's children.
///
/// [`crate::Metric::for_each_metric_data`] calls exactly one method per child,
/// chosen by the metric's kind. Both gauge variants report through
/// `consume_gauge`. A callback error aborts the iteration and propagates to
/// the export caller; metric state is never affected.
pub trait MetricDataConsumer {
    fn consume_counter(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        value: f64,
    ) -> Result<()>;

    fn consume_gauge(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        value: f64,
    ) -> Result<()>;

    fn consume_summary(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        data: &SummarySnapshot,
    ) -> Result<()>;

    fn consume_histogram(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        data: &HistogramSnapshot,
    ) -> Result<()>;
}
