//! Telegram Bot API adapter. Implements MessengerPort over HTTPS.
//!
//! Alerts are sent with `force_reply` markup so the admin's answer arrives
//! threaded to the alert, and with MarkdownV2 parse mode. User-controlled
//! fields are escaped before interpolation so ticket content can never be
//! misread as formatting syntax.

use crate::domain::{DomainError, PendingTicket};
use crate::ports::MessengerPort;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

pub const TELEGRAM_API_BASE_URL_DEFAULT: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const PARSE_MODE_MARKDOWN_V2: &str = "MarkdownV2";

/// Bot API envelope: `{ok, result, description}`.
#[derive(Clone, Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: T,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct SendMessageResult {
    #[serde(default)]
    message_id: i64,
}

/// Telegram messenger for a single admin chat.
pub struct BotApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
    admin_chat_id: i64,
}

impl BotApi {
    /// Create a new Bot API client.
    ///
    /// # Arguments
    /// * `base_url` - API base (normally `https://api.telegram.org`)
    /// * `token` - bot token from @BotFather
    /// * `admin_chat_id` - chat that receives alerts and confirmations
    pub fn new(base_url: String, token: String, admin_chat_id: i64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url,
            token,
            admin_chat_id,
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.base_url.trim_end_matches('/'),
            self.token
        )
    }

    async fn send_message(&self, body: &serde_json::Value) -> Result<i64, DomainError> {
        let res = self
            .client
            .post(self.send_message_url())
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::Messenger(format!("sendMessage request failed: {}", e)))?;

        let parsed: ApiResponse<SendMessageResult> = res
            .json()
            .await
            .map_err(|e| DomainError::Messenger(format!("sendMessage response parse failed: {}", e)))?;

        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| "sendMessage failed".to_string());
            return Err(DomainError::Messenger(description));
        }

        Ok(parsed.result.message_id)
    }
}

#[async_trait::async_trait]
impl MessengerPort for BotApi {
    async fn send_alert(&self, ticket: &PendingTicket) -> Result<i64, DomainError> {
        let body = serde_json::json!({
            "chat_id": self.admin_chat_id,
            "text": format_alert(ticket),
            "parse_mode": PARSE_MODE_MARKDOWN_V2,
            "reply_markup": {"force_reply": true},
        });
        let message_id = self.send_message(&body).await?;
        info!(ticket_id = ticket.id, message_id, "alert sent");
        Ok(message_id)
    }

    async fn send_confirmation(&self, ticket_id: i64, reply_text: &str) {
        let body = serde_json::json!({
            "chat_id": self.admin_chat_id,
            "text": format!("\u{2705} Reply sent to Ticket #{}\n\n{}", ticket_id, reply_text),
        });
        if let Err(e) = self.send_message(&body).await {
            warn!(ticket_id, error = %e, "confirmation send failed (ignored)");
        }
    }
}

/// Compose the MarkdownV2 alert from structured ticket fields.
fn format_alert(ticket: &PendingTicket) -> String {
    format!(
        "\u{1F4E8} *New Support Ticket*\n\n\
         *Ticket ID:* `{}`\n\
         *User:* {}\n\
         *Email:* {}\n\
         *Subject:* {}\n\n\
         *Latest Message:*\n{}\n\n\
         \u{1F449} Swipe to reply",
        ticket.id,
        escape_markdown_v2(&ticket.requester_name),
        escape_markdown_v2(&ticket.requester_email),
        escape_markdown_v2(&ticket.subject),
        escape_markdown_v2(ticket.alert_body()),
    )
}

/// Backslash-escape every character MarkdownV2 reserves.
fn escape_markdown_v2(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().saturating_add(8));
    for ch in raw.chars() {
        if matches!(
            ch,
            '_' | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
