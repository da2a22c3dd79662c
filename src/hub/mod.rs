//! Notification lifecycle manager.
//!
//! # State Machine
//!
//! ```text
//! Pending --send--> Sent --mark_read--> Read
//!    |                ^                   ^
//!    +----send--> Failed --mark_read------+
//!                  |  ^
//!                  +--+ retry_failed (send again)
//! ```
//!
//! Every send upserts the notification row by id and appends exactly one
//! delivery-log row, atomically. Concurrent sends of the same id race and the
//! last write wins; callers needing per-id exclusivity must coordinate
//! themselves.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::DatabaseConfig;
use crate::delivery::{DeliveryExecutor, SimulatedTransport, Transport};
use crate::error::{HubError, Result};
use crate::metrics::LifecycleMetrics;
use crate::notification::{DeliveryLog, Notification};
use crate::stats::{HubStats, StatsAggregator};
use crate::storage::{NotificationStore, SqliteStore};
use crate::template::{RenderedTemplate, Template};

/// Entry point for sending, reading, and reporting on notifications
pub struct NotificationHub {
    store: Arc<dyn NotificationStore>,
    executor: DeliveryExecutor,
    stats: StatsAggregator,
}

impl NotificationHub {
    /// Create a hub over `store` delivering through `transport`
    pub fn new(store: Arc<dyn NotificationStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            executor: DeliveryExecutor::new(store.clone(), transport),
            stats: StatsAggregator::new(store.clone()),
            store,
        }
    }

    /// Create a hub whose deliveries only validate the channel
    pub fn with_simulated_transport(store: Arc<dyn NotificationStore>) -> Self {
        Self::new(store, Arc::new(SimulatedTransport))
    }

    /// Open the SQLite database described by `config` with the simulated transport
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let store = SqliteStore::open(config).await?;
        Ok(Self::with_simulated_transport(Arc::new(store)))
    }

    /// Deliver `notification` and persist the outcome.
    ///
    /// Returns whether delivery succeeded. An invalid channel is a failed
    /// delivery, not an error; `Err` means storage failed.
    pub async fn send(&self, notification: &mut Notification) -> Result<bool> {
        self.executor.execute(notification).await
    }

    /// Send each notification in order; one failed delivery does not stop the rest.
    ///
    /// Results are keyed by id in sorted order. Duplicate ids overwrite each
    /// other, so the map holds the last outcome per id.
    #[tracing::instrument(name = "hub.batch_send", skip(self, notifications), fields(count = notifications.len()))]
    pub async fn batch_send(
        &self,
        notifications: &mut [Notification],
    ) -> Result<BTreeMap<String, bool>> {
        let mut results = BTreeMap::new();
        for notification in notifications.iter_mut() {
            let success = self.send(notification).await?;
            results.insert(notification.id.clone(), success);
        }

        tracing::info!(
            sent = results.values().filter(|ok| **ok).count(),
            failed = results.values().filter(|ok| !**ok).count(),
            "Batch send complete"
        );

        Ok(results)
    }

    /// Move a `sent` or `failed` notification to `read`.
    ///
    /// Returns `false` without changing anything when the id is unknown or the
    /// notification is already read, so repeating the call is harmless.
    #[tracing::instrument(name = "hub.mark_read", skip(self))]
    pub async fn mark_read(&self, id: &str) -> Result<bool> {
        let updated = self.store.mark_read(id).await?;
        if updated {
            LifecycleMetrics::record_read();
            tracing::debug!("Notification marked as read");
        } else {
            tracing::debug!("Notification not found or already read");
        }
        Ok(updated)
    }

    /// Re-send every `failed` notification, bumping its `retry_count` first.
    ///
    /// Returns how many retries ended in success.
    #[tracing::instrument(name = "hub.retry_failed", skip(self))]
    pub async fn retry_failed(&self) -> Result<usize> {
        let failed = self.store.list_failed().await?;
        let total = failed.len();
        let mut recovered = 0;

        for mut notification in failed {
            notification.retry_count += 1;
            let success = self.send(&mut notification).await?;
            LifecycleMetrics::record_retry(success);
            if success {
                recovered += 1;
            }
        }

        tracing::info!(retried = total, recovered = recovered, "Retried failed notifications");
        Ok(recovered)
    }

    /// Unread (`sent`) notifications for `recipient`, newest first
    pub async fn get_unread(&self, recipient: &str) -> Result<Vec<Notification>> {
        Ok(self.store.list_unread(recipient).await?)
    }

    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>> {
        Ok(self.store.get_notification(id).await?)
    }

    /// Delivery attempts for `id`, newest first
    pub async fn delivery_log(&self, id: &str) -> Result<Vec<DeliveryLog>> {
        Ok(self.store.list_delivery_log(id).await?)
    }

    /// Store `template`, replacing any template with the same name
    pub async fn save_template(&self, template: &Template) -> Result<()> {
        self.store.upsert_template(template).await?;
        tracing::debug!(template = %template.name, "Template saved");
        Ok(())
    }

    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        Ok(self.store.list_templates().await?)
    }

    /// Render the stored template `name` against `context`.
    ///
    /// Fails with `TemplateNotFound` when no such template exists.
    pub async fn render_template(&self, name: &str, context: &Value) -> Result<RenderedTemplate> {
        let template = self
            .store
            .get_template(name)
            .await?
            .ok_or_else(|| HubError::TemplateNotFound(name.to_string()))?;

        LifecycleMetrics::record_template_render();
        Ok(template.render(context))
    }

    /// Render the stored template `name` and send the result to `recipient`
    /// over the template's channel.
    #[tracing::instrument(name = "hub.send_templated", skip(self, context, metadata))]
    pub async fn send_templated(
        &self,
        name: &str,
        context: &Value,
        recipient: &str,
        kind: &str,
        metadata: Map<String, Value>,
    ) -> Result<Notification> {
        let rendered = self.render_template(name, context).await?;

        let mut notification = Notification::builder(recipient)
            .kind(kind)
            .subject(rendered.subject)
            .body(rendered.body)
            .raw_channel(rendered.channel)
            .metadata(metadata)
            .build();

        self.send(&mut notification).await?;
        Ok(notification)
    }

    /// Aggregate statistics, optionally restricted to one channel
    pub async fn stats(&self, channel: Option<&str>) -> Result<HubStats> {
        self.stats.stats(channel).await
    }
}
