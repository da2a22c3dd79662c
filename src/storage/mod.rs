//! Persistence for notifications, templates, and delivery attempts.
//!
//! # Backend Architecture
//!
//! The lifecycle manager and statistics aggregator talk to storage through the
//! `NotificationStore` trait. `SqliteStore` is the shipped implementation:
//!
//! - Notification upsert and delivery-log insert for one send commit together
//! - `delivery_log.notification_id` is a foreign key, so no orphaned attempts
//! - Aggregates are read inside a single transaction (WAL snapshot)
//!
//! Use `SqliteStore::open()` to create the pool and apply migrations.

mod backend;
mod models;
mod pool;
mod sqlite;

pub use backend::{AggregateCounts, NotificationStore, StoreError, StoreResult};
pub use pool::connect;
pub use sqlite::SqliteStore;
