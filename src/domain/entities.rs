//! Domain entities. Pure data structures for the core business.
//!
//! No SQL/Telegram/IO types here — these are mapped from adapters.

use serde::{Deserialize, Serialize};

/// Dedup-key sentinel for a ticket that has no customer message yet.
pub const INITIAL_MESSAGE_MARKER: &str = "initial";

/// Ticket status as stored by the SmartPanel `tickets` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Pending,
    CustomerReply,
    Answered,
}

impl TicketStatus {
    /// Parse the database string form. Returns None for statuses this system never handles.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "customer-reply" => Some(Self::CustomerReply),
            "answered" => Some(Self::Answered),
            _ => None,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::CustomerReply => "customer-reply",
            Self::Answered => "answered",
        }
    }
}

/// A ticket awaiting admin attention, joined with its requester and latest
/// customer-authored message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTicket {
    pub id: i64,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub requester_name: String,
    pub requester_email: String,
    /// Most recent customer-authored message; None when the ticket only has its description.
    pub latest_message: Option<String>,
    pub latest_message_id: Option<i64>,
}

impl PendingTicket {
    /// Text to alert the admin with: the latest customer message, falling back
    /// to the ticket description when no message exists yet.
    pub fn alert_body(&self) -> &str {
        self.latest_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.description.trim())
    }

    /// Dedup key identifying this ticket's current state: `<id>_<latestMsgId>`,
    /// or `<id>_initial` before the first customer message.
    pub fn dedup_key(&self) -> String {
        match self.latest_message_id {
            Some(msg_id) => format!("{}_{}", self.id, msg_id),
            None => format!("{}_{}", self.id, INITIAL_MESSAGE_MARKER),
        }
    }
}

/// An inbound admin reply candidate, mapped from a Telegram webhook update.
///
/// Carries everything the reply handler needs to accept or reject the event;
/// validation happens in the use case, not here.
#[derive(Debug, Clone)]
pub struct ReplyEvent {
    pub chat_id: i64,
    /// Telegram id of the message being replied to; None when the event is not a reply.
    pub reply_to_message_id: Option<i64>,
    /// Reply text, whitespace-trimmed. May be empty.
    pub text: String,
}
