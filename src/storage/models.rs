//! Row types and conversions between SQLite rows and domain values.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::notification::{DeliveryLog, Notification, NotificationStatus};
use crate::template::Template;

use super::backend::{StoreError, StoreResult};

#[derive(Debug, FromRow)]
pub(super) struct NotificationRow {
    pub id: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub channel: String,
    pub status: String,
    pub sent_at: Option<i64>,
    pub created_at: i64,
    pub metadata: String,
    pub retry_count: i64,
}

#[derive(Debug, FromRow)]
pub(super) struct DeliveryLogRow {
    pub id: i64,
    pub notification_id: String,
    pub channel: String,
    pub attempt_at: i64,
    pub success: bool,
    pub error_msg: Option<String>,
    pub latency_ms: Option<f64>,
}

#[derive(Debug, FromRow)]
pub(super) struct TemplateRow {
    pub name: String,
    pub channel: String,
    pub subject_template: String,
    pub body_template: String,
    pub created_at: i64,
}

pub(super) fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(micros: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Corrupt(format!("{column} out of range: {micros}")))
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> StoreResult<Self> {
        let status = NotificationStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!("notification {} has status '{}'", row.id, row.status))
        })?;
        let retry_count = u32::try_from(row.retry_count).map_err(|_| {
            StoreError::Corrupt(format!(
                "notification {} has retry_count {}",
                row.id, row.retry_count
            ))
        })?;

        Ok(Notification {
            status,
            retry_count,
            sent_at: row.sent_at.map(|v| from_micros(v, "sent_at")).transpose()?,
            created_at: from_micros(row.created_at, "created_at")?,
            metadata: serde_json::from_str(&row.metadata)?,
            id: row.id,
            kind: row.kind,
            recipient: row.recipient,
            subject: row.subject,
            body: row.body,
            channel: row.channel,
        })
    }
}

impl TryFrom<DeliveryLogRow> for DeliveryLog {
    type Error = StoreError;

    fn try_from(row: DeliveryLogRow) -> StoreResult<Self> {
        Ok(DeliveryLog {
            id: Some(row.id),
            attempt_at: from_micros(row.attempt_at, "attempt_at")?,
            notification_id: row.notification_id,
            channel: row.channel,
            success: row.success,
            error_msg: row.error_msg,
            latency_ms: row.latency_ms,
        })
    }
}

impl TryFrom<TemplateRow> for Template {
    type Error = StoreError;

    fn try_from(row: TemplateRow) -> StoreResult<Self> {
        Ok(Template {
            created_at: from_micros(row.created_at, "created_at")?,
            name: row.name,
            channel: row.channel,
            subject_template: row.subject_template,
            body_template: row.body_template,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> NotificationRow {
        NotificationRow {
            id: "n-1".to_string(),
            kind: "alert".to_string(),
            recipient: "a@b.c".to_string(),
            subject: "S".to_string(),
            body: "B".to_string(),
            channel: "email".to_string(),
            status: status.to_string(),
            sent_at: None,
            created_at: 1_700_000_000_000_000,
            metadata: r#"{"nested":{"k":[1,2]}}"#.to_string(),
            retry_count: 2,
        }
    }

    #[test]
    fn test_notification_row_conversion() {
        let n = Notification::try_from(row("sent")).unwrap();
        assert_eq!(n.status, NotificationStatus::Sent);
        assert_eq!(n.retry_count, 2);
        assert_eq!(n.metadata["nested"]["k"][1], 2);
        assert_eq!(to_micros(n.created_at), 1_700_000_000_000_000);
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        assert!(matches!(
            Notification::try_from(row("archived")),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_negative_retry_count_is_corrupt() {
        let mut bad = row("failed");
        bad.retry_count = -1;
        assert!(matches!(Notification::try_from(bad), Err(StoreError::Corrupt(_))));
    }
}
