//! metrion export: wire-format renderers over metric registries.
//!
//! Both formatters walk a registry through the core's push-visitor contract
//! and stream bytes straight into a caller-supplied writer. Exporting is
//! read-only with respect to metric state, so a failed export can always be
//! retried on the next scrape.

pub mod protobuf;
pub mod text;

pub use protobuf::{ProtobufFormatter, CONTENT_TYPE_PROTOBUF};
pub use text::{TextFormatter, CONTENT_TYPE_TEXT};
