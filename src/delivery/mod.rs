//! Delivery of a single notification attempt.
//!
//! - `transport`: the `Transport` capability that actually moves a message over
//!   a channel, plus `SimulatedTransport` which accepts every valid channel
//! - `executor`: validates the channel, times the transport call, and records
//!   the attempt together with the notification's new status

mod executor;
mod transport;

pub use executor::{DeliveryAttempt, DeliveryExecutor};
pub use transport::{SimulatedTransport, Transport, TransportOutcome};
