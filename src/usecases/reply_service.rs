//! Reply handler: ingest one admin reply from Telegram into the ticket store.
//!
//! Rejection is silent: the webhook caller always gets an acknowledgement, so
//! Telegram never retries. Only a genuine admin reply that resolves through
//! the correlation map touches the store.

use crate::domain::{DomainError, ReplyEvent};
use crate::ports::{CorrelationPort, MessengerPort, TicketStorePort};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of handling one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Event was not an admin reply to a tracked alert; nothing was written.
    Ignored,
    /// Reply was written to the store for this ticket.
    Replied { ticket_id: i64 },
}

/// Reply service. One stateless event per invocation.
pub struct ReplyService {
    store: Arc<dyn TicketStorePort>,
    messenger: Arc<dyn MessengerPort>,
    map: Arc<dyn CorrelationPort>,
    admin_chat_id: i64,
}

impl ReplyService {
    pub fn new(
        store: Arc<dyn TicketStorePort>,
        messenger: Arc<dyn MessengerPort>,
        map: Arc<dyn CorrelationPort>,
        admin_chat_id: i64,
    ) -> Self {
        Self {
            store,
            messenger,
            map,
            admin_chat_id,
        }
    }

    /// Handle one reply candidate. Store failures bubble up; everything that
    /// merely disqualifies the event resolves to `Ignored`.
    ///
    /// The three store writes run in order without a wrapping transaction; a
    /// failure between them leaves the ticket partially updated.
    pub async fn handle(&self, event: ReplyEvent) -> Result<ReplyOutcome, DomainError> {
        if event.chat_id != self.admin_chat_id {
            debug!(chat_id = event.chat_id, "ignoring message from non-admin chat");
            return Ok(ReplyOutcome::Ignored);
        }
        let Some(reply_to) = event.reply_to_message_id else {
            debug!("ignoring message that is not a reply");
            return Ok(ReplyOutcome::Ignored);
        };
        if event.text.is_empty() {
            debug!(reply_to, "ignoring empty reply");
            return Ok(ReplyOutcome::Ignored);
        }
        let Some(ticket_id) = self.map.ticket_for_message(reply_to).await? else {
            debug!(reply_to, "ignoring reply to an unmapped message");
            return Ok(ReplyOutcome::Ignored);
        };

        self.store.append_admin_reply(ticket_id, &event.text).await?;
        self.store.mark_answered(ticket_id).await?;
        self.store.mark_customer_messages_read(ticket_id).await?;
        info!(ticket_id, reply_to, "admin reply saved");

        self.messenger.send_confirmation(ticket_id, &event.text).await;

        Ok(ReplyOutcome::Replied { ticket_id })
    }
}
