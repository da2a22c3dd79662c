// Supporting modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain
pub mod notification;
pub mod template;

// Persistence and delivery
pub mod delivery;
pub mod storage;

// Application layer
pub mod hub;
pub mod stats;

pub use error::{HubError, Result};
pub use hub::NotificationHub;
