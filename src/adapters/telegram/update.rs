//! Inbound webhook wire types for the Telegram Bot API.
//!
//! Only the fields this bot consumes are modeled; everything else in the
//! update payload is ignored by serde.

use crate::domain::ReplyEvent;
use serde::Deserialize;

/// A webhook `Update` as posted by the Bot API.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: i64,
}

impl Update {
    /// Map the update to a domain reply candidate. Returns None for updates
    /// that carry no message at all (edits, channel posts, etc. are dropped
    /// here; everything else is judged by the reply handler).
    pub fn into_reply_event(self) -> Option<ReplyEvent> {
        let msg = self.message?;
        Some(ReplyEvent {
            chat_id: msg.chat.id,
            reply_to_message_id: msg.reply_to_message.map(|r| r.message_id),
            text: msg.text.as_deref().unwrap_or("").trim().to_string(),
        })
    }
}
