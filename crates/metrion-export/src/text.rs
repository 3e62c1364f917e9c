//! Prometheus text exposition format 0.0.4.
//!
//! One `# HELP`/`# TYPE` header per metric, then one line per sample,
//! streamed straight into the output writer; no intermediate sample list is
//! materialized. How many lines a child expands into is decided here:
//! counters and gauges are one line, summaries are six quantiles plus
//! `_count`/`_sum`, histograms are one `_bucket` line per bound plus
//! `_count`/`_sum`.

use std::io::Write;
use std::sync::Arc;

use metrion_core::data::{HistogramSnapshot, MetricDataConsumer, SummarySnapshot};
use metrion_core::metric::MetricCommon;
use metrion_core::registry::MetricRegistry;
use metrion_core::Result;

/// Content type of the text exposition format.
pub const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders one or more registries as exposition text.
pub struct TextFormatter {
    registries: Vec<Arc<MetricRegistry>>,
}

impl TextFormatter {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self {
            registries: vec![registry],
        }
    }

    /// Formatter over several registries, rendered in sequence.
    pub fn with_registries(registries: Vec<Arc<MetricRegistry>>) -> Self {
        Self { registries }
    }

    /// Stream the current state of every metric into `out`.
    ///
    /// Read-only with respect to metric state: an I/O error mid-stream leaves
    /// the registries untouched and the export can simply be retried.
    pub fn export_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut families = 0usize;
        for registry in &self.registries {
            registry.for_each_metric(|metric| {
                writeln!(
                    out,
                    "# HELP {} {}",
                    metric.name(),
                    escape_help(metric.help())
                )?;
                writeln!(out, "# TYPE {} {}", metric.name(), metric.kind().as_str())?;
                let mut writer = TextSampleWriter {
                    static_labels: registry.static_labels(),
                    out: &mut *out,
                };
                metric.for_each_metric_data(&mut writer)?;
                families += 1;
                Ok(())
            })?;
        }
        tracing::debug!(families, "text exposition rendered");
        Ok(())
    }
}

struct TextSampleWriter<'a, W: Write> {
    static_labels: &'a [(String, String)],
    out: &'a mut W,
}

impl<W: Write> TextSampleWriter<'_, W> {
    fn write_sample(
        &mut self,
        metric: &MetricCommon,
        name_suffix: &str,
        label_values: &[String],
        extra_label: Option<(&str, &str)>,
        value: &str,
    ) -> Result<()> {
        write!(self.out, "{}{}", metric.name(), name_suffix)?;
        self.write_labels(metric.label_names(), label_values, extra_label)?;
        writeln!(self.out, " {value}")?;
        Ok(())
    }

    fn write_labels(
        &mut self,
        label_names: &[String],
        label_values: &[String],
        extra_label: Option<(&str, &str)>,
    ) -> Result<()> {
        if self.static_labels.is_empty() && label_names.is_empty() && extra_label.is_none() {
            return Ok(());
        }
        let mut parts = Vec::with_capacity(self.static_labels.len() + label_names.len() + 1);
        for (name, value) in self.static_labels {
            parts.push(format!("{name}=\"{}\"", escape_label_value(value)));
        }
        for (name, value) in label_names.iter().zip(label_values) {
            parts.push(format!("{name}=\"{}\"", escape_label_value(value)));
        }
        if let Some((name, value)) = extra_label {
            parts.push(format!("{name}=\"{}\"", escape_label_value(value)));
        }
        write!(self.out, "{{{}}}", parts.join(","))?;
        Ok(())
    }
}

impl<W: Write> MetricDataConsumer for TextSampleWriter<'_, W> {
    fn consume_counter(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        value: f64,
    ) -> Result<()> {
        self.write_sample(metric, "", label_values, None, &fmt_double(value))
    }

    fn consume_gauge(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        value: f64,
    ) -> Result<()> {
        self.write_sample(metric, "", label_values, None, &fmt_double(value))
    }

    fn consume_summary(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        data: &SummarySnapshot,
    ) -> Result<()> {
        for &(quantile, value) in data.quantiles() {
            self.write_sample(
                metric,
                "",
                label_values,
                Some(("quantile", &fmt_double(quantile))),
                &fmt_double(value),
            )?;
        }
        self.write_sample(
            metric,
            "_count",
            label_values,
            None,
            &data.count().to_string(),
        )?;
        self.write_sample(metric, "_sum", label_values, None, &fmt_double(data.sum()))
    }

    fn consume_histogram(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        data: &HistogramSnapshot,
    ) -> Result<()> {
        for (upper_bound, cumulative_count) in data.buckets() {
            self.write_sample(
                metric,
                "_bucket",
                label_values,
                Some(("le", &fmt_double(upper_bound))),
                &cumulative_count.to_string(),
            )?;
        }
        self.write_sample(
            metric,
            "_count",
            label_values,
            None,
            &data.count().to_string(),
        )?;
        self.write_sample(metric, "_sum", label_values, None, &fmt_double(data.sum()))
    }
}

/// Render a double the way Go does: `+Inf`, `-Inf`, `NaN`, otherwise the
/// shortest decimal that round-trips.
fn fmt_double(value: f64) -> String {
    if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value}")
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
