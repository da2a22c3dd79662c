//! Metrics export in a fresh process
//!
//! Kept in its own test binary so no other test has touched the metrics
//! before the first export.

use notification_hub::metrics::encode_metrics;

#[test]
fn test_fresh_process_exports_every_family() {
    let text = encode_metrics().unwrap();

    for family in [
        "hub_delivery_attempts_total",
        "hub_delivery_latency_seconds",
        "hub_notifications_read_total",
        "hub_retries_total",
        "hub_template_renders_total",
    ] {
        assert!(text.contains(family), "missing {family} in:\n{text}");
    }
    assert!(text.contains(r#"hub_delivery_attempts_total{channel="email",outcome="success"} 0"#));
    assert!(text.contains(r#"channel="invalid""#));
}
