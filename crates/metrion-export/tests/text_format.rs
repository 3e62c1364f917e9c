//! Text exposition output, end to end.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use metrion_core::{
    Counter, Histogram, MetricRegistry, ReservoirConfig, SettableGauge, Summary,
};
use metrion_export::TextFormatter;

fn render(registry: Arc<MetricRegistry>) -> String {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let mut out = Vec::new();
    TextFormatter::new(registry).export_to(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn unlabeled_counter_renders_header_and_one_line() {
    let registry = Arc::new(MetricRegistry::new());
    let metric = registry
        .get_or_register(
            Counter::builder("requests_total", "Total requests.")
                .build()
                .unwrap(),
        )
        .unwrap();
    metric.as_counter().unwrap().inc_by(3, &[]).unwrap();

    assert_eq!(
        render(registry),
        "# HELP requests_total Total requests.\n\
         # TYPE requests_total counter\n\
         requests_total 3\n"
    );
}

#[test]
fn static_and_metric_labels_are_merged_in_order() {
    let registry = Arc::new(
        MetricRegistry::with_static_labels(vec![("app".into(), "demo".into())]).unwrap(),
    );
    let metric = registry
        .get_or_register(
            Counter::builder("requests_total", "Total requests.")
                .with_labels(&["method"])
                .build()
                .unwrap(),
        )
        .unwrap();
    metric.as_counter().unwrap().inc_by(2, &["GET"]).unwrap();

    assert_eq!(
        render(registry),
        "# HELP requests_total Total requests.\n\
         # TYPE requests_total counter\n\
         requests_total{app=\"demo\",method=\"GET\"} 2\n"
    );
}

#[test]
fn settable_gauge_renders_as_gauge() {
    let registry = Arc::new(MetricRegistry::new());
    let metric = registry
        .get_or_register(
            SettableGauge::builder("queue_depth", "Current queue depth.")
                .build()
                .unwrap(),
        )
        .unwrap();
    metric.as_settable_gauge().unwrap().set(2.5, &[]).unwrap();

    assert_eq!(
        render(registry),
        "# HELP queue_depth Current queue depth.\n\
         # TYPE queue_depth gauge\n\
         queue_depth 2.5\n"
    );
}

#[test]
fn histogram_renders_buckets_count_and_sum() {
    let registry = Arc::new(MetricRegistry::new());
    let metric = registry
        .get_or_register(
            Histogram::builder("latency", "Request latency.")
                .with_buckets(&[1.0, 5.0, 10.0])
                .build()
                .unwrap(),
        )
        .unwrap();
    let histogram = metric.as_histogram().unwrap();
    histogram.observe(0.5, &[]).unwrap();
    histogram.observe(6.0, &[]).unwrap();
    histogram.observe(11.0, &[]).unwrap();

    assert_eq!(
        render(registry),
        "# HELP latency Request latency.\n\
         # TYPE latency histogram\n\
         latency_bucket{le=\"1\"} 1\n\
         latency_bucket{le=\"5\"} 1\n\
         latency_bucket{le=\"10\"} 2\n\
         latency_bucket{le=\"+Inf\"} 3\n\
         latency_count 3\n\
         latency_sum 17.5\n"
    );
}

#[test]
fn summary_renders_six_quantiles_count_and_sum() {
    let registry = Arc::new(MetricRegistry::new());
    let metric = registry
        .get_or_register(
            Summary::builder("resp_size", "Response sizes.")
                .with_reservoir(ReservoirConfig::SlidingWindow { size: 16 })
                .build()
                .unwrap(),
        )
        .unwrap();
    let summary = metric.as_summary().unwrap();
    for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
        summary.observe(value, &[]).unwrap();
    }

    assert_eq!(
        render(registry),
        "# HELP resp_size Response sizes.\n\
         # TYPE resp_size summary\n\
         resp_size{quantile=\"0.5\"} 3\n\
         resp_size{quantile=\"0.75\"} 4.5\n\
         resp_size{quantile=\"0.95\"} 5\n\
         resp_size{quantile=\"0.98\"} 5\n\
         resp_size{quantile=\"0.99\"} 5\n\
         resp_size{quantile=\"0.999\"} 5\n\
         resp_size_count 5\n\
         resp_size_sum 15\n"
    );
}

#[test]
fn labeled_histogram_places_le_after_metric_labels() {
    let registry = Arc::new(MetricRegistry::new());
    let metric = registry
        .get_or_register(
            Histogram::builder("latency", "Request latency.")
                .with_buckets(&[1.0])
                .with_labels(&["route"])
                .build()
                .unwrap(),
        )
        .unwrap();
    metric
        .as_histogram()
        .unwrap()
        .observe(0.5, &["/ping"])
        .unwrap();

    assert_eq!(
        render(registry),
        "# HELP latency Request latency.\n\
         # TYPE latency histogram\n\
         latency_bucket{route=\"/ping\",le=\"1\"} 1\n\
         latency_bucket{route=\"/ping\",le=\"+Inf\"} 1\n\
         latency_count{route=\"/ping\"} 1\n\
         latency_sum{route=\"/ping\"} 0.5\n"
    );
}

#[test]
fn help_and_label_values_are_escaped() {
    let registry = Arc::new(MetricRegistry::new());
    let metric = registry
        .get_or_register(
            Counter::builder("odd_total", "Line one\nline \\ two.")
                .with_labels(&["path"])
                .build()
                .unwrap(),
        )
        .unwrap();
    metric
        .as_counter()
        .unwrap()
        .inc(&["C:\\temp\"quoted\"\nnext"])
        .unwrap();

    assert_eq!(
        render(registry),
        "# HELP odd_total Line one\\nline \\\\ two.\n\
         # TYPE odd_total counter\n\
         odd_total{path=\"C:\\\\temp\\\"quoted\\\"\\nnext\"} 1\n"
    );
}

#[test]
fn export_is_stable_without_intervening_writes() {
    let registry = Arc::new(MetricRegistry::new());
    for name in ["a_total", "b_total", "c_total"] {
        let metric = registry
            .get_or_register(
                Counter::builder(name, "Help.")
                    .with_labels(&["k"])
                    .build()
                    .unwrap(),
            )
            .unwrap();
        metric.as_counter().unwrap().inc(&["v"]).unwrap();
    }

    let first = render(Arc::clone(&registry));
    let second = render(registry);
    assert_eq!(first, second);
}

#[test]
fn multiple_registries_render_in_sequence() {
    let first = Arc::new(MetricRegistry::new());
    first
        .get_or_register(Counter::builder("one_total", "First.").build().unwrap())
        .unwrap();
    let second = Arc::new(MetricRegistry::new());
    second
        .get_or_register(Counter::builder("two_total", "Second.").build().unwrap())
        .unwrap();

    let mut out = Vec::new();
    TextFormatter::with_registries(vec![first, second])
        .export_to(&mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();

    let one = text.find("# TYPE one_total counter").unwrap();
    let two = text.find("# TYPE two_total counter").unwrap();
    assert!(one < two);
}

#[test]
fn multi_metric_registry_contains_every_sample_line() {
    let registry = Arc::new(MetricRegistry::new());
    let counter = registry
        .get_or_register(Counter::builder("hits_total", "Hits.").build().unwrap())
        .unwrap();
    counter.as_counter().unwrap().inc(&[]).unwrap();
    let gauge = registry
        .get_or_register(
            SettableGauge::builder("depth", "Depth.").build().unwrap(),
        )
        .unwrap();
    gauge.as_settable_gauge().unwrap().set(4.0, &[]).unwrap();

    let text = render(registry);
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();

    // Child-iteration order across metrics is unspecified; compare sorted.
    let mut expected = vec![
        "# HELP hits_total Hits.",
        "# TYPE hits_total counter",
        "hits_total 1",
        "# HELP depth Depth.",
        "# TYPE depth gauge",
        "depth 4",
    ];
    expected.sort_unstable();
    assert_eq!(lines, expected);
}
