//! Shared error type across metrion crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetrionError>;

/// Unified error type used by the core and the exporters.
///
/// Configuration and usage errors are raised synchronously on the caller's
/// thread, before any aggregator state is mutated. `Io` only occurs on the
/// export path, which is read-only with respect to metric state, so a failed
/// export can always be retried.
#[derive(Debug, Error)]
pub enum MetrionError {
    #[error("invalid metric name: {0}")]
    InvalidMetricName(String),
    #[error("invalid label name: {0}")]
    InvalidLabelName(String),
    #[error("metric help must contain text")]
    BlankHelp,
    #[error("expected {expected} label values, got {actual}")]
    LabelCardinality { expected: usize, actual: usize },
    #[error("no child exists for the given label values")]
    UnknownLabels,
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("invalid reservoir: {0}")]
    InvalidReservoir(String),
    #[error("invalid gauge: {0}")]
    InvalidGauge(String),
    #[error("a metric named '{0}' is already registered with a different schema")]
    AlreadyRegistered(String),
    #[error("export i/o: {0}")]
    Io(#[from] std::io::Error),
}
