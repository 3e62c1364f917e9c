//! Histogram bucket assignment, snapshots, and timers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use metrion_core::{Histogram, ManualClock, MetrionError};

#[test]
fn bucket_assignment_and_cumulative_counts() {
    let histogram = Histogram::builder("latency_seconds", "Request latency.")
        .with_buckets(&[1.0, 5.0, 10.0])
        .build()
        .unwrap();

    histogram.observe(0.5, &[]).unwrap();
    histogram.observe(6.0, &[]).unwrap();
    histogram.observe(11.0, &[]).unwrap();

    let snapshot = histogram.snapshot(&[]).unwrap();
    let buckets: Vec<(f64, u64)> = snapshot.buckets().collect();
    assert_eq!(
        buckets,
        vec![(1.0, 1), (5.0, 1), (10.0, 2), (f64::INFINITY, 3)]
    );
    assert_eq!(snapshot.count(), 3);
    assert_eq!(snapshot.sum(), 17.5);
}

#[test]
fn cumulative_counts_are_monotonic_and_end_at_count() {
    let histogram = Histogram::builder("sizes", "Payload sizes.")
        .with_buckets(&[10.0, 20.0, 50.0, 100.0])
        .build()
        .unwrap();

    for value in [3.0, 15.0, 15.0, 60.0, 99.0, 250.0, 7.5, 42.0] {
        histogram.observe(value, &[]).unwrap();
    }

    let snapshot = histogram.snapshot(&[]).unwrap();
    let counts: Vec<u64> = snapshot.buckets().map(|(_, c)| c).collect();
    assert!(counts.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*counts.last().unwrap(), snapshot.count());
    assert_eq!(snapshot.count(), 8);
}

#[test]
fn equal_width_bucket_generator() {
    let histogram = Histogram::builder("widths", "Equal width buckets.")
        .with_equal_width_buckets(0.5, 1.0, 4)
        .build()
        .unwrap();

    let snapshot = histogram.snapshot(&[]).unwrap();
    let bounds: Vec<f64> = snapshot.buckets().map(|(b, _)| b).collect();
    assert_eq!(bounds, vec![0.5, 1.5, 2.5, 3.5, f64::INFINITY]);
}

#[test]
fn invalid_buckets_are_rejected_at_build_time() {
    let nan = Histogram::builder("h", "Help.")
        .with_buckets(&[1.0, f64::NAN])
        .build();
    assert!(matches!(nan, Err(MetrionError::InvalidBuckets(_))));

    let infinite = Histogram::builder("h", "Help.")
        .with_buckets(&[1.0, f64::INFINITY])
        .build();
    assert!(matches!(infinite, Err(MetrionError::InvalidBuckets(_))));

    let descending = Histogram::builder("h", "Help.")
        .with_buckets(&[5.0, 1.0])
        .build();
    assert!(matches!(descending, Err(MetrionError::InvalidBuckets(_))));

    let duplicate = Histogram::builder("h", "Help.")
        .with_buckets(&[1.0, 1.0])
        .build();
    assert!(matches!(duplicate, Err(MetrionError::InvalidBuckets(_))));
}

#[test]
fn observations_to_one_label_combination_do_not_leak() {
    let histogram = Histogram::builder("latency_seconds", "Request latency.")
        .with_buckets(&[1.0])
        .with_labels(&["route"])
        .build()
        .unwrap();

    histogram.observe(0.5, &["a"]).unwrap();
    histogram.observe(0.5, &["a"]).unwrap();
    histogram.observe(2.0, &["b"]).unwrap();

    let a = histogram.snapshot(&["a"]).unwrap();
    let b = histogram.snapshot(&["b"]).unwrap();
    assert_eq!(a.count(), 2);
    assert_eq!(a.sum(), 1.0);
    assert_eq!(b.count(), 1);
    assert_eq!(b.sum(), 2.0);
}

#[test]
fn timer_observes_elapsed_ticks() {
    let clock = Arc::new(ManualClock::new());
    let histogram = Histogram::builder("op_duration", "Operation duration in ticks.")
        .with_buckets(&[100.0, 1000.0])
        .with_clock(clock.clone())
        .build()
        .unwrap();

    let timer = histogram.start_timer(&[]).unwrap();
    clock.advance(500);
    timer.stop();

    let snapshot = histogram.snapshot(&[]).unwrap();
    assert_eq!(snapshot.count(), 1);
    assert_eq!(snapshot.sum(), 500.0);
    let buckets: Vec<(f64, u64)> = snapshot.buckets().collect();
    assert_eq!(buckets[0], (100.0, 0));
    assert_eq!(buckets[1], (1000.0, 1));
}

#[test]
fn arity_mismatch_fails_without_observing() {
    let histogram = Histogram::builder("latency_seconds", "Request latency.")
        .with_labels(&["route"])
        .build()
        .unwrap();

    assert!(histogram.observe(1.0, &[]).is_err());
    assert!(histogram.observe(1.0, &["a", "b"]).is_err());
    assert_eq!(histogram.snapshot(&["a"]).unwrap().count(), 0);
}
