//! Name grammar and builder validation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metrion_core::{Counter, MetrionError};

#[test]
fn metric_name_grammar() {
    assert!(Counter::builder("requests_total", "Help.").build().is_ok());
    assert!(Counter::builder("ns:requests_total", "Help.").build().is_ok());
    assert!(Counter::builder("_hidden", "Help.").build().is_ok());

    for bad in ["1requests", "req-total", "req total", ""] {
        let result = Counter::builder(bad, "Help.").build();
        assert!(
            matches!(result, Err(MetrionError::InvalidMetricName(_))),
            "expected '{bad}' to be rejected"
        );
    }
}

#[test]
fn label_name_grammar() {
    assert!(Counter::builder("m", "Help.")
        .with_labels(&["method", "_code"])
        .build()
        .is_ok());

    for bad in ["1label", "la-bel", "la:bel", ""] {
        let result = Counter::builder("m", "Help.").with_labels(&[bad]).build();
        assert!(
            matches!(result, Err(MetrionError::InvalidLabelName(_))),
            "expected label '{bad}' to be rejected"
        );
    }
}

#[test]
fn blank_help_is_rejected() {
    assert!(matches!(
        Counter::builder("m", "").build(),
        Err(MetrionError::BlankHelp)
    ));
    assert!(matches!(
        Counter::builder("m", "   ").build(),
        Err(MetrionError::BlankHelp)
    ));
}

#[test]
fn namespace_and_subsystem_prefix_the_name() {
    let counter = Counter::builder("requests", "Help.")
        .with_namespace("app")
        .with_subsystem("http")
        .build()
        .unwrap();
    assert_eq!(counter.common().name(), "app_http_requests");

    let no_subsystem = Counter::builder("requests", "Help.")
        .with_namespace("app")
        .build()
        .unwrap();
    assert_eq!(no_subsystem.common().name(), "app_requests");
}

#[test]
fn assembled_name_is_validated_as_a_whole() {
    let bad_namespace = Counter::builder("requests", "Help.")
        .with_namespace("1app")
        .build();
    assert!(matches!(
        bad_namespace,
        Err(MetrionError::InvalidMetricName(_))
    ));
}
