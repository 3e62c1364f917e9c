//! Length-delimited protobuf exposition (Prometheus client-model schema).
//!
//! Each metric renders as one `MetricFamily` message, framed by a varint
//! length prefix. The wire encoding is written by hand against the
//! client-model field numbers; the message set is small and fixed, so no
//! codegen dependency is carried.

use std::io::Write;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};

use metrion_core::data::{HistogramSnapshot, MetricDataConsumer, MetricKind, SummarySnapshot};
use metrion_core::metric::MetricCommon;
use metrion_core::registry::MetricRegistry;
use metrion_core::Result;

/// Content type of the delimited protobuf exposition format.
pub const CONTENT_TYPE_PROTOBUF: &str = "application/vnd.google.protobuf; \
     proto=io.prometheus.client.MetricFamily; encoding=delimited";

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LEN_DELIMITED: u32 = 2;

/// Field numbers from the client-model `metrics.proto`.
mod field {
    pub mod family {
        pub const NAME: u32 = 1;
        pub const HELP: u32 = 2;
        pub const KIND: u32 = 3;
        pub const METRIC: u32 = 4;
    }
    pub mod metric {
        pub const LABEL: u32 = 1;
        pub const GAUGE: u32 = 2;
        pub const COUNTER: u32 = 3;
        pub const SUMMARY: u32 = 4;
        pub const HISTOGRAM: u32 = 7;
    }
    pub mod label_pair {
        pub const NAME: u32 = 1;
        pub const VALUE: u32 = 2;
    }
    pub mod counter {
        pub const VALUE: u32 = 1;
    }
    pub mod gauge {
        pub const VALUE: u32 = 1;
    }
    pub mod summary {
        pub const COUNT: u32 = 1;
        pub const SUM: u32 = 2;
        pub const QUANTILE: u32 = 3;
    }
    pub mod quantile {
        pub const QUANTILE: u32 = 1;
        pub const VALUE: u32 = 2;
    }
    pub mod histogram {
        pub const COUNT: u32 = 1;
        pub const SUM: u32 = 2;
        pub const BUCKET: u32 = 3;
    }
    pub mod bucket {
        pub const CUMULATIVE_COUNT: u32 = 1;
        pub const UPPER_BOUND: u32 = 2;
    }
}

/// Client-model `MetricType` enum values.
fn kind_code(kind: MetricKind) -> u64 {
    match kind {
        MetricKind::Counter => 0,
        MetricKind::Gauge => 1,
        MetricKind::Summary => 2,
        MetricKind::Histogram => 4,
    }
}

fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

fn put_key(buf: &mut BytesMut, field: u32, wire: u32) {
    put_varint(buf, u64::from((field << 3) | wire));
}

fn put_uint64(buf: &mut BytesMut, field: u32, value: u64) {
    put_key(buf, field, WIRE_VARINT);
    put_varint(buf, value);
}

fn put_double(buf: &mut BytesMut, field: u32, value: f64) {
    put_key(buf, field, WIRE_FIXED64);
    buf.put_f64_le(value);
}

fn put_bytes(buf: &mut BytesMut, field: u32, payload: &[u8]) {
    put_key(buf, field, WIRE_LEN_DELIMITED);
    put_varint(buf, payload.len() as u64);
    buf.put_slice(payload);
}

/// Renders one or more registries as delimited `MetricFamily` messages.
pub struct ProtobufFormatter {
    registries: Vec<Arc<MetricRegistry>>,
}

impl ProtobufFormatter {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self {
            registries: vec![registry],
        }
    }

    /// Formatter over several registries, rendered in sequence.
    pub fn with_registries(registries: Vec<Arc<MetricRegistry>>) -> Self {
        Self { registries }
    }

    /// Stream every metric family into `out`, each prefixed with its varint
    /// length. Read-only; a failed export is safe to retry.
    pub fn export_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut families = 0usize;
        for registry in &self.registries {
            registry.for_each_metric(|metric| {
                let mut family = BytesMut::new();
                put_bytes(&mut family, field::family::NAME, metric.name().as_bytes());
                put_bytes(&mut family, field::family::HELP, metric.help().as_bytes());
                put_uint64(&mut family, field::family::KIND, kind_code(metric.kind()));

                let mut writer = FamilyWriter {
                    static_labels: registry.static_labels(),
                    family: &mut family,
                };
                metric.for_each_metric_data(&mut writer)?;

                let mut prefix = BytesMut::with_capacity(5);
                put_varint(&mut prefix, family.len() as u64);
                out.write_all(&prefix)?;
                out.write_all(&family)?;
                families += 1;
                Ok(())
            })?;
        }
        tracing::debug!(families, "protobuf exposition rendered");
        Ok(())
    }
}

/// Appends one `Metric` message per child to the family buffer.
struct FamilyWriter<'a> {
    static_labels: &'a [(String, String)],
    family: &'a mut BytesMut,
}

impl FamilyWriter<'_> {
    fn labels(&self, metric: &MetricCommon, label_values: &[String]) -> BytesMut {
        let mut buf = BytesMut::new();
        for (name, value) in self.static_labels {
            put_label_pair(&mut buf, name, value);
        }
        for (name, value) in metric.label_names().iter().zip(label_values) {
            put_label_pair(&mut buf, name, value);
        }
        buf
    }

    fn push_metric(&mut self, metric_msg: &BytesMut) {
        put_bytes(self.family, field::family::METRIC, metric_msg);
    }
}

fn put_label_pair(buf: &mut BytesMut, name: &str, value: &str) {
    let mut pair = BytesMut::new();
    put_bytes(&mut pair, field::label_pair::NAME, name.as_bytes());
    put_bytes(&mut pair, field::label_pair::VALUE, value.as_bytes());
    put_bytes(buf, field::metric::LABEL, &pair);
}

impl MetricDataConsumer for FamilyWriter<'_> {
    fn consume_counter(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        value: f64,
    ) -> Result<()> {
        let mut metric_msg = self.labels(metric, label_values);
        let mut payload = BytesMut::new();
        put_double(&mut payload, field::counter::VALUE, value);
        put_bytes(&mut metric_msg, field::metric::COUNTER, &payload);
        self.push_metric(&metric_msg);
        Ok(())
    }

    fn consume_gauge(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        value: f64,
    ) -> Result<()> {
        let mut metric_msg = self.labels(metric, label_values);
        let mut payload = BytesMut::new();
        put_double(&mut payload, field::gauge::VALUE, value);
        put_bytes(&mut metric_msg, field::metric::GAUGE, &payload);
        self.push_metric(&metric_msg);
        Ok(())
    }

    fn consume_summary(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        data: &SummarySnapshot,
    ) -> Result<()> {
        let mut metric_msg = self.labels(metric, label_values);
        let mut payload = BytesMut::new();
        put_uint64(&mut payload, field::summary::COUNT, data.count());
        put_double(&mut payload, field::summary::SUM, data.sum());
        for &(quantile, value) in data.quantiles() {
            let mut entry = BytesMut::new();
            put_double(&mut entry, field::quantile::QUANTILE, quantile);
            put_double(&mut entry, field::quantile::VALUE, value);
            put_bytes(&mut payload, field::summary::QUANTILE, &entry);
        }
        put_bytes(&mut metric_msg, field::metric::SUMMARY, &payload);
        self.push_metric(&metric_msg);
        Ok(())
    }

    fn consume_histogram(
        &mut self,
        metric: &MetricCommon,
        label_values: &[String],
        data: &HistogramSnapshot,
    ) -> Result<()> {
        let mut metric_msg = self.labels(metric, label_values);
        let mut payload = BytesMut::new();
        put_uint64(&mut payload, field::histogram::COUNT, data.count());
        put_double(&mut payload, field::histogram::SUM, data.sum());
        for (upper_bound, cumulative_count) in data.buckets() {
            let mut entry = BytesMut::new();
            put_uint64(&mut entry, field::bucket::CUMULATIVE_COUNT, cumulative_count);
            put_double(&mut entry, field::bucket::UPPER_BOUND, upper_bound);
            put_bytes(&mut payload, field::histogram::BUCKET, &entry);
        }
        put_bytes(&mut metric_msg, field::metric::HISTOGRAM, &payload);
        self.push_metric(&metric_msg);
        Ok(())
    }
}
