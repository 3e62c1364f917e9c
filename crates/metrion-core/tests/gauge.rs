//! Pull and settable gauge behavior.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrion_core::{Gauge, ManualClock, MetrionError, SettableGauge};

#[test]
fn settable_gauge_is_last_write_wins() {
    let gauge = SettableGauge::builder("queue_depth", "Current queue depth.")
        .build()
        .unwrap();

    assert_eq!(gauge.value(&[]).unwrap(), 0.0);
    gauge.set(42.5, &[]).unwrap();
    gauge.set(-7.0, &[]).unwrap();
    assert_eq!(gauge.value(&[]).unwrap(), -7.0);
}

#[test]
fn settable_gauge_children_are_isolated() {
    let gauge = SettableGauge::builder("queue_depth", "Current queue depth.")
        .with_labels(&["queue"])
        .build()
        .unwrap();

    gauge.set(3.0, &["ingest"]).unwrap();
    gauge.set(9.0, &["egress"]).unwrap();

    assert_eq!(gauge.value(&["ingest"]).unwrap(), 3.0);
    assert_eq!(gauge.value(&["egress"]).unwrap(), 9.0);
}

#[test]
fn settable_gauge_arity_is_checked() {
    let gauge = SettableGauge::builder("queue_depth", "Current queue depth.")
        .with_labels(&["queue"])
        .build()
        .unwrap();

    assert!(matches!(
        gauge.set(1.0, &[]),
        Err(MetrionError::LabelCardinality { .. })
    ));
}

#[test]
fn pull_gauge_reads_its_supplier() {
    let gauge = Gauge::builder("temperature", "Current temperature.")
        .with_value_supplier(|| 21.5, &[])
        .build()
        .unwrap();

    assert_eq!(gauge.value(&[]).unwrap(), 21.5);
}

#[test]
fn pull_gauge_caches_within_ttl() {
    let clock = Arc::new(ManualClock::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let gauge = Gauge::builder("expensive", "Expensive supplier.")
        .with_value_supplier(
            move || counter.fetch_add(1, Ordering::Relaxed) as f64 + 1.0,
            &[],
        )
        .with_cache_ttl(Duration::from_nanos(100))
        .with_clock(clock.clone())
        .build()
        .unwrap();

    assert_eq!(gauge.value(&[]).unwrap(), 1.0);
    assert_eq!(gauge.value(&[]).unwrap(), 1.0, "second read is cached");
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    clock.advance(100);
    assert_eq!(gauge.value(&[]).unwrap(), 2.0, "TTL expiry reloads");
    assert_eq!(calls.load(Ordering::Relaxed), 2);
}

#[test]
fn pull_gauge_rejects_unconfigured_label_values() {
    let gauge = Gauge::builder("disk_usage", "Disk usage per mount.")
        .with_labels(&["mount"])
        .with_value_supplier(|| 0.3, &["/"])
        .with_value_supplier(|| 0.7, &["/data"])
        .build()
        .unwrap();

    assert_eq!(gauge.value(&["/"]).unwrap(), 0.3);
    assert_eq!(gauge.value(&["/data"]).unwrap(), 0.7);
    assert!(matches!(
        gauge.value(&["/tmp"]),
        Err(MetrionError::UnknownLabels)
    ));
}

#[test]
fn pull_gauge_builder_validation() {
    let no_suppliers = Gauge::builder("g", "Help.").build();
    assert!(matches!(no_suppliers, Err(MetrionError::InvalidGauge(_))));

    let wrong_arity = Gauge::builder("g", "Help.")
        .with_labels(&["a", "b"])
        .with_value_supplier(|| 1.0, &["only-one"])
        .build();
    assert!(matches!(
        wrong_arity,
        Err(MetrionError::LabelCardinality { .. })
    ));

    let duplicate = Gauge::builder("g", "Help.")
        .with_labels(&["a"])
        .with_value_supplier(|| 1.0, &["x"])
        .with_value_supplier(|| 2.0, &["x"])
        .build();
    assert!(matches!(duplicate, Err(MetrionError::InvalidGauge(_))));
}
