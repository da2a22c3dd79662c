//! Prometheus metrics for the notification hub.
//!
//! Metrics are process-local; a long-running embedder can scrape them via
//! `encode_metrics()`, and the CLI prints them with the `metrics` command.
//! Call `init()` at startup so every series is exported from zero.
//! - Delivery attempts by channel and outcome, plus attempt latency
//! - Read transitions
//! - Retry outcomes
//! - Template renders

mod helpers;

pub use helpers::{encode_metrics, init, DeliveryMetrics, LifecycleMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "hub";

lazy_static! {
    /// Delivery attempts by channel and outcome
    pub static ref DELIVERY_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_delivery_attempts_total", METRIC_PREFIX),
        "Total delivery attempts",
        &["channel", "outcome"]
    ).unwrap();

    /// Time spent in the transport per attempt
    pub static ref DELIVERY_LATENCY: Histogram = register_histogram!(
        format!("{}_delivery_latency_seconds", METRIC_PREFIX),
        "Delivery attempt latency in seconds",
        vec![0.0001, 0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    /// Notifications moved to the read state
    pub static ref NOTIFICATIONS_READ_TOTAL: IntCounter = register_int_counter!(
        format!("{}_notifications_read_total", METRIC_PREFIX),
        "Total notifications marked as read"
    ).unwrap();

    /// Retries of failed notifications by outcome
    pub static ref RETRIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_retries_total", METRIC_PREFIX),
        "Total retries of failed notifications",
        &["outcome"]
    ).unwrap();

    /// Stored templates rendered
    pub static ref TEMPLATE_RENDERS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_template_renders_total", METRIC_PREFIX),
        "Total stored template renders"
    ).unwrap();
}
