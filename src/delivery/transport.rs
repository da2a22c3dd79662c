//! Transport trait for channel delivery.
//!
//! Real deployments implement `Transport` with SMTP, Slack, webhook, or push
//! clients. Timeouts and backoff for those calls belong to the implementation.

use async_trait::async_trait;

use crate::notification::{Channel, Notification};

/// What a transport reports back for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOutcome {
    pub success: bool,
    pub error_message: Option<String>,
}

impl TransportOutcome {
    pub fn delivered() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// Capability to attempt delivery over a channel.
///
/// Invoked exactly once per send attempt. The channel has already been
/// validated against the closed set.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn attempt_delivery(&self, channel: Channel, notification: &Notification)
        -> TransportOutcome;
}

/// Transport that reports success for every channel without sending anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedTransport;

#[async_trait]
impl Transport for SimulatedTransport {
    async fn attempt_delivery(
        &self,
        channel: Channel,
        notification: &Notification,
    ) -> TransportOutcome {
        tracing::trace!(
            notification_id = %notification.id,
            channel = %channel,
            recipient = %notification.recipient,
            "Simulated delivery"
        );
        TransportOutcome::delivered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_transport_accepts_all_channels() {
        let transport = SimulatedTransport;
        for channel in Channel::ALL {
            let n = Notification::new("t", "u@e.com", "S", "B", channel);
            assert_eq!(
                transport.attempt_delivery(channel, &n).await,
                TransportOutcome::delivered()
            );
        }
    }

    #[test]
    fn test_failed_outcome_carries_message() {
        let outcome = TransportOutcome::failed("connection refused");
        assert!(!outcome.success);
        assert_eq!(outcome.error_message.as_deref(), Some("connection refused"));
    }
}
