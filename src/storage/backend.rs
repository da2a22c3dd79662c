//! Backend trait for notification storage.
//!
//! This module defines the abstraction layer between the hub and its
//! persistent state, so the SQLite implementation can be swapped out.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::notification::{DeliveryLog, Notification};
use crate::template::Template;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx operation failed
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Metadata (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database directory could not be prepared
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted row holds a value outside its allowed domain
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Raw counts backing the statistics report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateCounts {
    /// Number of notification rows
    pub total_notifications: u64,

    /// Notification rows grouped by persisted status
    pub by_status: BTreeMap<String, u64>,

    /// Notification rows grouped by persisted channel
    pub by_channel: BTreeMap<String, u64>,

    /// Number of delivery-log rows
    pub total_delivery_attempts: u64,

    /// Delivery-log rows with `success = true`
    pub successful_deliveries: u64,
}

/// Backend trait for notification storage.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`) as they are shared
/// across concurrent senders.
///
/// # Write Semantics
///
/// Notifications and templates are upserted by key: the last write wins and
/// no version is kept. Delivery-log rows are append-only.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert or overwrite a notification row keyed by `id`.
    async fn upsert_notification(&self, notification: &Notification) -> StoreResult<()>;

    /// Append one delivery attempt, returning its assigned id.
    ///
    /// Fails if the referenced notification does not exist.
    async fn append_delivery_log(&self, entry: &DeliveryLog) -> StoreResult<i64>;

    /// Upsert the notification and append its delivery attempt atomically.
    async fn record_attempt(
        &self,
        notification: &Notification,
        entry: &DeliveryLog,
    ) -> StoreResult<i64>;

    /// Fetch a single notification by id.
    async fn get_notification(&self, id: &str) -> StoreResult<Option<Notification>>;

    /// Move a `sent` or `failed` notification to `read`.
    ///
    /// Returns `false` when the id is unknown or the row is not in a readable state.
    async fn mark_read(&self, id: &str) -> StoreResult<bool>;

    /// Notifications for `recipient` with status `sent`, newest first.
    async fn list_unread(&self, recipient: &str) -> StoreResult<Vec<Notification>>;

    /// Every notification currently `failed`, oldest first.
    async fn list_failed(&self) -> StoreResult<Vec<Notification>>;

    /// Delivery attempts for a notification, newest first.
    async fn list_delivery_log(&self, notification_id: &str) -> StoreResult<Vec<DeliveryLog>>;

    /// Insert or overwrite a template keyed by `name`.
    async fn upsert_template(&self, template: &Template) -> StoreResult<()>;

    /// Fetch a template by name.
    async fn get_template(&self, name: &str) -> StoreResult<Option<Template>>;

    /// All templates ordered by name.
    async fn list_templates(&self) -> StoreResult<Vec<Template>>;

    /// Counts over current state, optionally restricted to one channel.
    async fn aggregate_counts(&self, channel: Option<&str>) -> StoreResult<AggregateCounts>;
}
