//! Implements TicketStorePort against the SmartPanel MySQL schema.
//!
//! Tables touched: `tickets`, `ticket_messages`, `general_users`.
//! Timestamps are written with SQL NOW() so they match the panel's own rows.

use crate::domain::{DomainError, PendingTicket, TicketStatus};
use crate::ports::TicketStorePort;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::info;

/// Admin-authored rows use uid 0 and the fixed author label the panel expects.
const ADMIN_UID: i64 = 0;
const ADMIN_AUTHOR: &str = "Admin";

/// MySQL-backed ticket store.
pub struct MySqlTicketStore {
    pool: MySqlPool,
}

impl MySqlTicketStore {
    /// Connect to the SmartPanel database. Connection failure is fatal to the
    /// invocation; callers abort rather than retry.
    pub async fn connect(database_url: &str) -> Result<Self, DomainError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(|e| DomainError::Store(format!("Database connection failed: {}", e)))?;
        info!("connected to ticket store");
        Ok(Self { pool })
    }

    fn parse_ticket_row(row: MySqlRow) -> Result<PendingTicket, DomainError> {
        let status_raw: String = row
            .try_get("status")
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let status = TicketStatus::parse(&status_raw)
            .ok_or_else(|| DomainError::Store(format!("unknown ticket status: {}", status_raw)))?;

        Ok(PendingTicket {
            id: row
                .try_get("ticket_id")
                .map_err(|e| DomainError::Store(e.to_string()))?,
            subject: row
                .try_get("subject")
                .map_err(|e| DomainError::Store(e.to_string()))?,
            description: row
                .try_get("description")
                .map_err(|e| DomainError::Store(e.to_string()))?,
            status,
            requester_name: row
                .try_get("fullname")
                .map_err(|e| DomainError::Store(e.to_string()))?,
            requester_email: row
                .try_get("email")
                .map_err(|e| DomainError::Store(e.to_string()))?,
            latest_message: row
                .try_get("latest_message")
                .map_err(|e| DomainError::Store(e.to_string()))?,
            latest_message_id: row
                .try_get("latest_msg_id")
                .map_err(|e| DomainError::Store(e.to_string()))?,
        })
    }
}

#[async_trait::async_trait]
impl TicketStorePort for MySqlTicketStore {
    async fn tickets_needing_attention(&self) -> Result<Vec<PendingTicket>, DomainError> {
        let rows = sqlx::query(
            "SELECT \
                 t.id AS ticket_id, \
                 t.subject, \
                 t.description, \
                 t.status, \
                 gu.email, \
                 CONCAT(gu.first_name, ' ', gu.last_name) AS fullname, \
                 ( \
                     SELECT tm.message \
                     FROM ticket_messages tm \
                     WHERE tm.ticket_id = t.id AND tm.support = 0 \
                     ORDER BY tm.id DESC \
                     LIMIT 1 \
                 ) AS latest_message, \
                 ( \
                     SELECT tm.id \
                     FROM ticket_messages tm \
                     WHERE tm.ticket_id = t.id AND tm.support = 0 \
                     ORDER BY tm.id DESC \
                     LIMIT 1 \
                 ) AS latest_msg_id \
             FROM tickets t \
             INNER JOIN general_users gu ON gu.id = t.uid \
             WHERE t.status IN ('pending', 'customer-reply') \
             ORDER BY t.changed DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Store(format!("Query failed: {}", e)))?;

        rows.into_iter().map(Self::parse_ticket_row).collect()
    }

    async fn append_admin_reply(&self, ticket_id: i64, text: &str) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO ticket_messages \
                 (ticket_id, uid, author, support, message, is_read, created, changed) \
             VALUES (?, ?, ?, 1, ?, 1, NOW(), NOW())",
        )
        .bind(ticket_id)
        .bind(ADMIN_UID)
        .bind(ADMIN_AUTHOR)
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Store(format!("insert reply: {}", e)))?;
        Ok(())
    }

    async fn mark_answered(&self, ticket_id: i64) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE tickets \
             SET status = ?, admin_read = 1, changed = NOW() \
             WHERE id = ?",
        )
        .bind(TicketStatus::Answered.as_db_str())
        .bind(ticket_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Store(format!("update ticket status: {}", e)))?;
        Ok(())
    }

    async fn mark_customer_messages_read(&self, ticket_id: i64) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE ticket_messages \
             SET is_read = 1 \
             WHERE ticket_id = ? AND support = 0",
        )
        .bind(ticket_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Store(format!("mark messages read: {}", e)))?;
        Ok(())
    }
}
