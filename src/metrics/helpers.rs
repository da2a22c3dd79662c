//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::notification::Channel;

use super::{
    DELIVERY_ATTEMPTS_TOTAL, DELIVERY_LATENCY, NOTIFICATIONS_READ_TOTAL, RETRIES_TOTAL,
    TEMPLATE_RENDERS_TOTAL,
};

/// Label used for attempts whose channel is outside the known set
const INVALID_CHANNEL_LABEL: &str = "invalid";

const OUTCOMES: [&str; 2] = ["success", "failure"];

/// Register every metric and create its label series at zero.
///
/// Prometheus omits families with no series, so without this a fresh
/// process would export nothing. Safe to call repeatedly.
pub fn init() {
    let channels = Channel::ALL
        .iter()
        .map(Channel::as_str)
        .chain(std::iter::once(INVALID_CHANNEL_LABEL));
    for channel in channels {
        for outcome in OUTCOMES {
            DELIVERY_ATTEMPTS_TOTAL.with_label_values(&[channel, outcome]);
        }
    }
    for outcome in OUTCOMES {
        RETRIES_TOTAL.with_label_values(&[outcome]);
    }
    lazy_static::initialize(&DELIVERY_LATENCY);
    lazy_static::initialize(&NOTIFICATIONS_READ_TOTAL);
    lazy_static::initialize(&TEMPLATE_RENDERS_TOTAL);
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    init();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

fn outcome(success: bool) -> &'static str {
    if success {
        OUTCOMES[0]
    } else {
        OUTCOMES[1]
    }
}

/// Known channels label as themselves; anything else shares one label
fn channel_label(channel: &str) -> &str {
    match channel.parse::<Channel>() {
        Ok(_) => channel,
        Err(_) => INVALID_CHANNEL_LABEL,
    }
}

/// Helper struct for recording delivery metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    /// Record one attempt; unrecognized channels are counted under `invalid`
    pub fn record_attempt(channel: &str, success: bool, latency_ms: f64) {
        DELIVERY_ATTEMPTS_TOTAL
            .with_label_values(&[channel_label(channel), outcome(success)])
            .inc();
        DELIVERY_LATENCY.observe(latency_ms / 1000.0);
    }
}

/// Helper struct for recording lifecycle metrics
pub struct LifecycleMetrics;

impl LifecycleMetrics {
    pub fn record_read() {
        NOTIFICATIONS_READ_TOTAL.inc();
    }

    pub fn record_retry(success: bool) {
        RETRIES_TOTAL.with_label_values(&[outcome(success)]).inc();
    }

    pub fn record_template_render() {
        TEMPLATE_RENDERS_TOTAL.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_attempt_increments_counter() {
        let before = DELIVERY_ATTEMPTS_TOTAL
            .with_label_values(&["webhook", "failure"])
            .get();
        DeliveryMetrics::record_attempt("webhook", false, 0.5);
        let after = DELIVERY_ATTEMPTS_TOTAL
            .with_label_values(&["webhook", "failure"])
            .get();
        assert!(after > before);
    }

    #[test]
    fn test_invalid_channels_share_one_label() {
        let before = DELIVERY_ATTEMPTS_TOTAL
            .with_label_values(&["invalid", "failure"])
            .get();
        DeliveryMetrics::record_attempt("carrier-pigeon-7", false, 0.1);
        DeliveryMetrics::record_attempt("smoke-signal", false, 0.1);
        let after = DELIVERY_ATTEMPTS_TOTAL
            .with_label_values(&["invalid", "failure"])
            .get();
        assert!(after >= before + 2);

        let text = encode_metrics().unwrap();
        assert!(!text.contains("carrier-pigeon-7"));
        assert!(!text.contains("smoke-signal"));
    }

    #[test]
    fn test_channel_label() {
        assert_eq!(channel_label("slack"), "slack");
        assert_eq!(channel_label("Slack"), "invalid");
        assert_eq!(channel_label(""), "invalid");
    }

    #[test]
    fn test_encode_metrics_contains_prefix() {
        LifecycleMetrics::record_template_render();
        let text = encode_metrics().unwrap();
        assert!(text.contains("hub_template_renders_total"));
    }
}
