//! Delivery statistics computed on demand from storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::storage::{AggregateCounts, NotificationStore};

/// Statistics report; every count reflects storage at call time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubStats {
    pub total_notifications: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_channel: BTreeMap<String, u64>,
    pub total_delivery_attempts: u64,
    pub successful_deliveries: u64,
    /// Percentage rounded to two decimals; 0.0 when there were no attempts
    pub delivery_success_rate_pct: f64,
    pub filter_channel: Option<String>,
}

impl HubStats {
    pub fn from_counts(counts: AggregateCounts, filter_channel: Option<String>) -> Self {
        Self {
            delivery_success_rate_pct: success_rate_pct(
                counts.successful_deliveries,
                counts.total_delivery_attempts,
            ),
            total_notifications: counts.total_notifications,
            by_status: counts.by_status,
            by_channel: counts.by_channel,
            total_delivery_attempts: counts.total_delivery_attempts,
            successful_deliveries: counts.successful_deliveries,
            filter_channel,
        }
    }
}

/// `successful / attempts * 100`, rounded to two decimals
pub fn success_rate_pct(successful: u64, attempts: u64) -> f64 {
    if attempts == 0 {
        return 0.0;
    }
    let pct = successful as f64 / attempts as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Computes `HubStats` from the store; no caching
pub struct StatsAggregator {
    store: Arc<dyn NotificationStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Aggregate over all rows, or only rows whose channel equals `channel`.
    ///
    /// An empty channel means no filter.
    pub async fn stats(&self, channel: Option<&str>) -> Result<HubStats> {
        let channel = channel.filter(|c| !c.is_empty());
        let counts = self.store.aggregate_counts(channel).await?;
        Ok(HubStats::from_counts(counts, channel.map(str::to_string)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::notification::{Channel, DeliveryLog, Notification, NotificationStatus};
    use crate::storage::SqliteStore;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_success_rate_zero_attempts() {
        assert_eq!(success_rate_pct(0, 0), 0.0);
    }

    #[test]
    fn test_success_rate_rounding() {
        assert_eq!(success_rate_pct(1, 1), 100.0);
        assert_eq!(success_rate_pct(1, 2), 50.0);
        assert_eq!(success_rate_pct(1, 3), 33.33);
        assert_eq!(success_rate_pct(2, 3), 66.67);
    }

    #[test]
    fn test_from_counts() {
        let mut by_status = BTreeMap::new();
        by_status.insert("sent".to_string(), 3);
        by_status.insert("failed".to_string(), 1);

        let stats = HubStats::from_counts(
            AggregateCounts {
                total_notifications: 4,
                by_status,
                by_channel: BTreeMap::from([("email".to_string(), 4)]),
                total_delivery_attempts: 4,
                successful_deliveries: 3,
            },
            Some("email".to_string()),
        );

        assert_eq!(stats.delivery_success_rate_pct, 75.0);
        assert_eq!(stats.filter_channel.as_deref(), Some("email"));

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["by_status"]["sent"], 3);
        assert_eq!(json["filter_channel"], "email");
    }

    #[test]
    fn test_empty_counts_serialize_null_filter() {
        let stats = HubStats::from_counts(AggregateCounts::default(), None);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["delivery_success_rate_pct"], 0.0);
        assert!(json["filter_channel"].is_null());
    }

    #[tokio::test]
    async fn test_empty_channel_means_no_filter() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            SqliteStore::open(&DatabaseConfig::at(dir.path().join("hub.db")))
                .await
                .unwrap(),
        );
        let mut n = Notification::new("t", "a@b.c", "S", "B", Channel::Webhook);
        n.status = NotificationStatus::Sent;
        let log = DeliveryLog {
            id: None,
            notification_id: n.id.clone(),
            channel: n.channel.clone(),
            attempt_at: Utc::now(),
            success: true,
            error_msg: None,
            latency_ms: Some(0.01),
        };
        store.record_attempt(&n, &log).await.unwrap();

        let aggregator = StatsAggregator::new(store);
        let unfiltered = aggregator.stats(Some("")).await.unwrap();
        assert_eq!(unfiltered.total_notifications, 1);
        assert_eq!(unfiltered.delivery_success_rate_pct, 100.0);
        assert!(unfiltered.filter_channel.is_none());
        assert_eq!(unfiltered, aggregator.stats(None).await.unwrap());
    }
}
