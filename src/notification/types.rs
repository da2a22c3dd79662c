use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::HubError;

/// Delivery medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Slack,
    Webhook,
    Push,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Email, Channel::Slack, Channel::Webhook, Channel::Push];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Slack => "slack",
            Channel::Webhook => "webhook",
            Channel::Push => "push",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| HubError::InvalidChannel(s.to_string()))
    }
}

/// Lifecycle state of a notification.
///
/// `Pending` only exists in memory before the first send attempt.
/// `Read` is terminal and reachable only from `Sent` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Failed,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
            NotificationStatus::Read => "read",
        }
    }

    /// Parse a persisted status value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(NotificationStatus::Pending),
            "sent" => Some(NotificationStatus::Sent),
            "failed" => Some(NotificationStatus::Failed),
            "read" => Some(NotificationStatus::Read),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message instance with identity, content, and lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier, generated at creation
    pub id: String,
    /// Free-form category (e.g. "alert", "welcome")
    #[serde(rename = "type")]
    pub kind: String,
    /// Channel-specific address, not validated here
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Channel name as given; validated at send time
    pub channel: String,
    #[serde(default)]
    pub status: NotificationStatus,
    /// Set once on the first successful delivery
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Opaque caller data, round-tripped verbatim
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub retry_count: u32,
}

impl Notification {
    /// Create a new pending notification with a fresh id
    pub fn new(
        kind: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        channel: Channel,
    ) -> Self {
        NotificationBuilder::new(recipient)
            .kind(kind)
            .subject(subject)
            .body(body)
            .channel(channel)
            .build()
    }

    /// Create a builder addressed to `recipient`
    pub fn builder(recipient: impl Into<String>) -> NotificationBuilder {
        NotificationBuilder::new(recipient)
    }

    /// Validate the channel against the closed set
    pub fn parsed_channel(&self) -> Result<Channel, HubError> {
        self.channel.parse()
    }
}

/// Builder for creating notifications
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    id: Option<String>,
    kind: String,
    recipient: String,
    subject: String,
    body: String,
    channel: String,
    metadata: Map<String, Value>,
    created_at: Option<DateTime<Utc>>,
}

impl NotificationBuilder {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: default_kind(),
            recipient: recipient.into(),
            subject: String::new(),
            body: String::new(),
            channel: default_channel(),
            metadata: Map::new(),
            created_at: None,
        }
    }

    /// Use a caller-chosen id instead of a generated one
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn channel(mut self, channel: Channel) -> Self {
        self.channel = channel.as_str().to_string();
        self
    }

    /// Set the channel from an unchecked string
    pub fn raw_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Insert a single metadata entry
    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> Notification {
        Notification {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            kind: self.kind,
            recipient: self.recipient,
            subject: self.subject,
            body: self.body,
            channel: self.channel,
            status: NotificationStatus::Pending,
            sent_at: None,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            metadata: self.metadata,
            retry_count: 0,
        }
    }
}

/// Notification as submitted in a batch file
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRequest {
    /// Optional id; reusing one overwrites the stored row
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NotificationRequest {
    pub fn into_notification(self) -> Notification {
        let mut builder = NotificationBuilder::new(self.recipient)
            .kind(self.kind)
            .subject(self.subject)
            .body(self.body)
            .raw_channel(self.channel)
            .metadata(self.metadata);
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        builder.build()
    }
}

fn default_kind() -> String {
    "general".to_string()
}

fn default_channel() -> String {
    Channel::Email.as_str().to_string()
}

/// Append-only record of one delivery attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLog {
    /// Assigned by storage on insert
    pub id: Option<i64>,
    pub notification_id: String,
    pub channel: String,
    pub attempt_at: DateTime<Utc>,
    pub success: bool,
    pub error_msg: Option<String>,
    pub latency_ms: Option<f64>,
}
