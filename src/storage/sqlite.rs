//! SQLite-based notification store.
//!
//! Table structure:
//! - `notifications` - one row per notification id (upserted)
//! - `templates` - one row per template name (upserted)
//! - `delivery_log` - append-only attempt history

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use crate::config::DatabaseConfig;
use crate::notification::{DeliveryLog, Notification, NotificationStatus};
use crate::template::Template;

use super::backend::{AggregateCounts, NotificationStore, StoreResult};
use super::models::{to_micros, DeliveryLogRow, NotificationRow, TemplateRow};
use super::pool::connect;

/// SQLite-based notification store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool whose schema is already migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database described by `config`.
    pub async fn open(config: &DatabaseConfig) -> StoreResult<Self> {
        Ok(Self::new(connect(config).await?))
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn upsert_notification_tx(
    conn: &mut SqliteConnection,
    notification: &Notification,
) -> StoreResult<()> {
    let metadata = serde_json::to_string(&notification.metadata)?;

    sqlx::query(
        r#"
        INSERT INTO notifications
            (id, type, recipient, subject, body, channel, status, sent_at,
             created_at, metadata, retry_count)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            type = excluded.type,
            recipient = excluded.recipient,
            subject = excluded.subject,
            body = excluded.body,
            channel = excluded.channel,
            status = excluded.status,
            sent_at = excluded.sent_at,
            created_at = excluded.created_at,
            metadata = excluded.metadata,
            retry_count = excluded.retry_count
        "#,
    )
    .bind(&notification.id)
    .bind(&notification.kind)
    .bind(&notification.recipient)
    .bind(&notification.subject)
    .bind(&notification.body)
    .bind(&notification.channel)
    .bind(notification.status.as_str())
    .bind(notification.sent_at.map(to_micros))
    .bind(to_micros(notification.created_at))
    .bind(metadata)
    .bind(i64::from(notification.retry_count))
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_delivery_log_tx(conn: &mut SqliteConnection, entry: &DeliveryLog) -> StoreResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO delivery_log
            (notification_id, channel, attempt_at, success, error_msg, latency_ms)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.notification_id)
    .bind(&entry.channel)
    .bind(to_micros(entry.attempt_at))
    .bind(entry.success)
    .bind(&entry.error_msg)
    .bind(entry.latency_ms)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// `SELECT COUNT(*)` with an optional trailing `channel = ?` filter.
async fn count_rows(
    conn: &mut SqliteConnection,
    sql: &str,
    channel: Option<&str>,
) -> StoreResult<u64> {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    if let Some(channel) = channel {
        query = query.bind(channel);
    }
    let count = query.fetch_one(conn).await?;
    Ok(count.max(0) as u64)
}

/// `SELECT key, COUNT(*) ... GROUP BY key` into a sorted map.
async fn group_counts(
    conn: &mut SqliteConnection,
    sql: &str,
    channel: Option<&str>,
) -> StoreResult<BTreeMap<String, u64>> {
    let mut query = sqlx::query_as::<_, (String, i64)>(sql);
    if let Some(channel) = channel {
        query = query.bind(channel);
    }
    let rows = query.fetch_all(conn).await?;
    Ok(rows
        .into_iter()
        .map(|(key, count)| (key, count.max(0) as u64))
        .collect())
}

#[async_trait]
impl NotificationStore for SqliteStore {
    async fn upsert_notification(&self, notification: &Notification) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        upsert_notification_tx(&mut tx, notification).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn append_delivery_log(&self, entry: &DeliveryLog) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id = insert_delivery_log_tx(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn record_attempt(
        &self,
        notification: &Notification,
        entry: &DeliveryLog,
    ) -> StoreResult<i64> {
        // Dropping the transaction on error rolls both writes back
        let mut tx = self.pool.begin().await?;
        upsert_notification_tx(&mut tx, notification).await?;
        let id = insert_delivery_log_tx(&mut tx, entry).await?;
        tx.commit().await?;

        tracing::trace!(
            notification_id = %notification.id,
            delivery_log_id = id,
            status = %notification.status,
            "Recorded delivery attempt"
        );

        Ok(id)
    }

    async fn get_notification(&self, id: &str) -> StoreResult<Option<Notification>> {
        sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Notification::try_from)
            .transpose()
    }

    async fn mark_read(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = ? WHERE id = ? AND status IN (?, ?)",
        )
        .bind(NotificationStatus::Read.as_str())
        .bind(id)
        .bind(NotificationStatus::Sent.as_str())
        .bind(NotificationStatus::Failed.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_unread(&self, recipient: &str) -> StoreResult<Vec<Notification>> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE recipient = ? AND status = ? \
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(recipient)
        .bind(NotificationStatus::Sent.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Notification::try_from)
        .collect()
    }

    async fn list_failed(&self) -> StoreResult<Vec<Notification>> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE status = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(NotificationStatus::Failed.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Notification::try_from)
        .collect()
    }

    async fn list_delivery_log(&self, notification_id: &str) -> StoreResult<Vec<DeliveryLog>> {
        sqlx::query_as::<_, DeliveryLogRow>(
            "SELECT * FROM delivery_log WHERE notification_id = ? ORDER BY attempt_at DESC, id DESC",
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(DeliveryLog::try_from)
        .collect()
    }

    async fn upsert_template(&self, template: &Template) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO templates (name, channel, subject_template, body_template, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                channel = excluded.channel,
                subject_template = excluded.subject_template,
                body_template = excluded.body_template,
                created_at = excluded.created_at
            "#,
        )
        .bind(&template.name)
        .bind(&template.channel)
        .bind(&template.subject_template)
        .bind(&template.body_template)
        .bind(to_micros(template.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_template(&self, name: &str) -> StoreResult<Option<Template>> {
        sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(Template::try_from)
            .transpose()
    }

    async fn list_templates(&self) -> StoreResult<Vec<Template>> {
        sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Template::try_from)
            .collect()
    }

    async fn aggregate_counts(&self, channel: Option<&str>) -> StoreResult<AggregateCounts> {
        let filter = if channel.is_some() { "WHERE channel = ?" } else { "" };
        let success_filter = if channel.is_some() {
            "WHERE channel = ? AND success = 1"
        } else {
            "WHERE success = 1"
        };

        // One transaction so every count sees the same snapshot
        let mut tx = self.pool.begin().await?;

        let total_notifications = count_rows(
            &mut tx,
            &format!("SELECT COUNT(*) FROM notifications {filter}"),
            channel,
        )
        .await?;
        let by_status = group_counts(
            &mut tx,
            &format!("SELECT status, COUNT(*) FROM notifications {filter} GROUP BY status"),
            channel,
        )
        .await?;
        let by_channel = group_counts(
            &mut tx,
            &format!("SELECT channel, COUNT(*) FROM notifications {filter} GROUP BY channel"),
            channel,
        )
        .await?;
        let total_delivery_attempts = count_rows(
            &mut tx,
            &format!("SELECT COUNT(*) FROM delivery_log {filter}"),
            channel,
        )
        .await?;
        let successful_deliveries = count_rows(
            &mut tx,
            &format!("SELECT COUNT(*) FROM delivery_log {success_filter}"),
            channel,
        )
        .await?;

        tx.commit().await?;

        Ok(AggregateCounts {
            total_notifications,
            by_status,
            by_channel,
            total_delivery_attempts,
            successful_deliveries,
        })
    }
}
