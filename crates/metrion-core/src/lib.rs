//! metrion core: metric data model, concurrent aggregation, and the sample
//! visitation contract consumed by exporters.
//!
//! Application threads write through the metric types (`inc`, `set`,
//! `observe`) with lock-minimal primitives; an exporter walks the registry
//! and receives per-child snapshots through [`data::MetricDataConsumer`]
//! without pausing writers. This crate performs no I/O of its own.
//!
//! # Error surface
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `MetrionError`/`Result`, and usage errors
//! (wrong label arity) fail before any aggregator state is touched.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod atomics;
pub mod children;
pub mod clock;
pub mod counter;
pub mod data;
pub mod error;
pub mod gauge;
pub mod histogram;
pub mod label;
pub mod metric;
pub mod registry;
pub mod reservoir;
pub mod settable_gauge;
pub mod summary;

pub use clock::{Clock, ManualClock, SystemClock, Timer};
pub use counter::Counter;
pub use data::{HistogramSnapshot, MetricDataConsumer, MetricKind, SummarySnapshot};
pub use error::{MetrionError, Result};
pub use gauge::Gauge;
pub use histogram::Histogram;
pub use metric::{Metric, MetricCommon};
pub use registry::MetricRegistry;
pub use reservoir::ReservoirConfig;
pub use settable_gauge::SettableGauge;
pub use summary::Summary;
