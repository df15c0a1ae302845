//! Port traits. API boundaries for the hexagon.
//!
//! Outbound only: the application calls into infrastructure. Both entry points
//! (notifier run, webhook event) are driven directly from main.

pub mod outbound;

pub use outbound::{CorrelationPort, MessengerPort, TicketStorePort};
