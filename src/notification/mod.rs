//! Notification records, channels, and lifecycle states.

mod types;

pub use types::{
    Channel, DeliveryLog, Notification, NotificationBuilder, NotificationRequest,
    NotificationStatus,
};
