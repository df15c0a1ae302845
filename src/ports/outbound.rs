//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{DomainError, PendingTicket};

/// Ticket store gateway. Reads attention-needing tickets, writes admin replies.
#[async_trait::async_trait]
pub trait TicketStorePort: Send + Sync {
    /// Tickets with status pending/customer-reply, joined with requester identity
    /// and the latest customer-authored message. Most recently changed first.
    async fn tickets_needing_attention(&self) -> Result<Vec<PendingTicket>, DomainError>;

    /// Insert an admin-authored message on the ticket, already marked read.
    async fn append_admin_reply(&self, ticket_id: i64, text: &str) -> Result<(), DomainError>;

    /// Transition the ticket to answered and flag it admin-read.
    async fn mark_answered(&self, ticket_id: i64) -> Result<(), DomainError>;

    /// Flag every customer-authored message on the ticket as read.
    async fn mark_customer_messages_read(&self, ticket_id: i64) -> Result<(), DomainError>;
}

/// Chat messenger gateway. Pushes alerts to the admin and confirms saved replies.
#[async_trait::async_trait]
pub trait MessengerPort: Send + Sync {
    /// Send a formatted ticket alert to the admin chat with a force-reply
    /// affordance, so the admin's answer is threaded to this message.
    /// Returns the outbound message id on success.
    async fn send_alert(&self, ticket: &PendingTicket) -> Result<i64, DomainError>;

    /// Best-effort confirmation that a reply reached the store. Failures are
    /// logged by the adapter and never surfaced.
    async fn send_confirmation(&self, ticket_id: i64, reply_text: &str);
}

/// Correlation map. Outbound message id -> ticket id routing plus per-state
/// dedup markers. Additions are staged in memory until `save()`.
#[async_trait::async_trait]
pub trait CorrelationPort: Send + Sync {
    /// Resolve the ticket an outbound message was sent for.
    async fn ticket_for_message(&self, message_id: i64) -> Result<Option<i64>, DomainError>;

    /// Whether an alert was already sent for this `<ticketId>_<latestMsgId|initial>` key.
    async fn is_alerted(&self, dedup_key: &str) -> Result<bool, DomainError>;

    /// Stage a message-id -> ticket-id route.
    async fn record_sent(&self, message_id: i64, ticket_id: i64) -> Result<(), DomainError>;

    /// Stage a dedup marker for the given key.
    async fn mark_alerted(&self, dedup_key: &str) -> Result<(), DomainError>;

    /// Persist the full map (loaded + staged entries), replacing prior contents.
    async fn save(&self) -> Result<(), DomainError>;
}
