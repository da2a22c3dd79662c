use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::metrics::DeliveryMetrics;
use crate::notification::{DeliveryLog, Notification, NotificationStatus};
use crate::storage::NotificationStore;

use super::{Transport, TransportOutcome};

/// Outcome of one attempt, before it is persisted
#[derive(Debug, Clone)]
pub struct DeliveryAttempt {
    /// `Sent` or `Failed`
    pub status: NotificationStatus,
    /// Delivery time to store on the notification
    pub sent_at: Option<DateTime<Utc>>,
    /// Audit row for this attempt
    pub log: DeliveryLog,
}

impl DeliveryAttempt {
    pub fn success(&self) -> bool {
        self.log.success
    }
}

/// Performs delivery attempts and records them
pub struct DeliveryExecutor {
    store: Arc<dyn NotificationStore>,
    transport: Arc<dyn Transport>,
}

impl DeliveryExecutor {
    pub fn new(store: Arc<dyn NotificationStore>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// Validate the channel and run the transport, without touching storage.
    ///
    /// An unrecognized channel never reaches the transport; it produces a
    /// failed attempt whose error names the channel.
    pub async fn attempt(&self, notification: &Notification) -> DeliveryAttempt {
        let started = Instant::now();
        let outcome = match notification.parsed_channel() {
            Ok(channel) => self.transport.attempt_delivery(channel, notification).await,
            Err(e) => TransportOutcome::failed(e.to_string()),
        };
        let latency_ms = round_ms(started.elapsed().as_secs_f64() * 1000.0);
        let now = Utc::now();

        let (status, sent_at) = if outcome.success {
            // sent_at is immutable once set
            (NotificationStatus::Sent, notification.sent_at.or(Some(now)))
        } else {
            (NotificationStatus::Failed, notification.sent_at)
        };

        DeliveryAttempt {
            status,
            sent_at,
            log: DeliveryLog {
                id: None,
                notification_id: notification.id.clone(),
                channel: notification.channel.clone(),
                attempt_at: now,
                success: outcome.success,
                error_msg: outcome.error_message,
                latency_ms: Some(latency_ms),
            },
        }
    }

    /// Attempt delivery and persist the notification row plus its attempt.
    ///
    /// On success `notification` is updated in place with the new status and
    /// `sent_at`. Storage failures propagate and leave it untouched.
    #[tracing::instrument(
        name = "delivery.execute",
        skip(self, notification),
        fields(notification_id = %notification.id, channel = %notification.channel)
    )]
    pub async fn execute(&self, notification: &mut Notification) -> Result<bool> {
        let attempt = self.attempt(notification).await;

        let mut updated = notification.clone();
        updated.status = attempt.status;
        updated.sent_at = attempt.sent_at;

        let log_id = self.store.record_attempt(&updated, &attempt.log).await?;
        *notification = updated;

        let success = attempt.success();
        let latency_ms = attempt.log.latency_ms.unwrap_or_default();
        DeliveryMetrics::record_attempt(&notification.channel, success, latency_ms);

        if success {
            tracing::debug!(
                delivery_log_id = log_id,
                latency_ms = latency_ms,
                "Notification delivered"
            );
        } else {
            tracing::warn!(
                delivery_log_id = log_id,
                error = attempt.log.error_msg.as_deref().unwrap_or(""),
                "Notification delivery failed"
            );
        }

        Ok(success)
    }
}

/// Milliseconds rounded to three decimals
fn round_ms(ms: f64) -> f64 {
    (ms * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::delivery::SimulatedTransport;
    use crate::notification::Channel;
    use crate::storage::SqliteStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Transport that fails every call and counts invocations
    #[derive(Default)]
    struct RejectingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for RejectingTransport {
        async fn attempt_delivery(&self, _: Channel, _: &Notification) -> TransportOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TransportOutcome::failed("gateway unavailable")
        }
    }

    async fn executor_with(transport: Arc<dyn Transport>) -> (TempDir, Arc<SqliteStore>, DeliveryExecutor) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            SqliteStore::open(&DatabaseConfig::at(dir.path().join("hub.db")))
                .await
                .unwrap(),
        );
        let executor = DeliveryExecutor::new(store.clone(), transport);
        (dir, store, executor)
    }

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(1.23456), 1.235);
        assert_eq!(round_ms(0.0), 0.0);
    }

    #[tokio::test]
    async fn test_attempt_valid_channel() {
        let (_dir, _store, executor) = executor_with(Arc::new(SimulatedTransport)).await;
        let n = Notification::new("t", "u@e.com", "S", "B", Channel::Webhook);

        let attempt = executor.attempt(&n).await;
        assert!(attempt.success());
        assert_eq!(attempt.status, NotificationStatus::Sent);
        assert!(attempt.sent_at.is_some());
        assert!(attempt.log.error_msg.is_none());
        assert!(attempt.log.latency_ms.unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_invalid_channel_skips_transport() {
        let transport = Arc::new(RejectingTransport::default());
        let (_dir, _store, executor) = executor_with(transport.clone()).await;
        let n = Notification::builder("u@e.com").raw_channel("carrier-pigeon").build();

        let attempt = executor.attempt(&n).await;
        assert!(!attempt.success());
        assert_eq!(attempt.status, NotificationStatus::Failed);
        assert!(attempt.sent_at.is_none());
        assert_eq!(
            attempt.log.error_msg.as_deref(),
            Some("Unknown channel: carrier-pigeon")
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded() {
        let transport = Arc::new(RejectingTransport::default());
        let (_dir, store, executor) = executor_with(transport.clone()).await;
        let mut n = Notification::new("t", "u@e.com", "S", "B", Channel::Email);

        assert!(!executor.execute(&mut n).await.unwrap());
        assert_eq!(n.status, NotificationStatus::Failed);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let log = store.list_delivery_log(&n.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].error_msg.as_deref(), Some("gateway unavailable"));
    }

    #[tokio::test]
    async fn test_execute_keeps_first_sent_at() {
        let (_dir, store, executor) = executor_with(Arc::new(SimulatedTransport)).await;
        let mut n = Notification::new("t", "u@e.com", "S", "B", Channel::Push);

        executor.execute(&mut n).await.unwrap();
        let first = n.sent_at;
        executor.execute(&mut n).await.unwrap();

        assert_eq!(n.sent_at, first);
        let stored = store.get_notification(&n.id).await.unwrap().unwrap();
        assert_eq!(stored.status, NotificationStatus::Sent);
        assert_eq!(store.list_delivery_log(&n.id).await.unwrap().len(), 2);
    }
}
