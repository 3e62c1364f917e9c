//! Metric and label name grammar.
//!
//! Names are validated exactly once, when a metric is built or a registry is
//! given static labels. The hot observation path never re-validates strings;
//! it only checks label-value arity.

use crate::error::{MetrionError, Result};

/// Validate a metric name: `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) => is_name_start(c, true) && chars.all(|c| is_name_continue(c, true)),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MetrionError::InvalidMetricName(name.to_string()))
    }
}

/// Validate a label name: `[a-zA-Z_][a-zA-Z0-9_]*`.
pub fn validate_label_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) => is_name_start(c, false) && chars.all(|c| is_name_continue(c, false)),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MetrionError::InvalidLabelName(name.to_string()))
    }
}

fn is_name_start(c: char, allow_colon: bool) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (allow_colon && c == ':')
}

fn is_name_continue(c: char, allow_colon: bool) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || (allow_colon && c == ':')
}

/// Owned copy of a caller-supplied label-value slice, used as the child map
/// key. Values are positional; ordering is the identity.
pub(crate) fn to_owned_values(label_values: &[&str]) -> Vec<String> {
    label_values.iter().map(|v| v.to_string()).collect()
}
