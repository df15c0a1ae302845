//! Notifier pass: query attention-needing tickets -> dedup -> alert -> record.
//!
//! - Skips tickets whose (ticket, latest-message) state was already alerted
//! - A failed send skips that ticket for this run; no map entry is staged,
//!   so the next run retries it
//! - The full map is persisted once, after all tickets are processed

use crate::domain::DomainError;
use crate::ports::{CorrelationPort, MessengerPort, TicketStorePort};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Notifier service. One stateless pass per invocation.
pub struct NotifierService {
    store: Arc<dyn TicketStorePort>,
    messenger: Arc<dyn MessengerPort>,
    map: Arc<dyn CorrelationPort>,
}

impl NotifierService {
    pub fn new(
        store: Arc<dyn TicketStorePort>,
        messenger: Arc<dyn MessengerPort>,
        map: Arc<dyn CorrelationPort>,
    ) -> Self {
        Self {
            store,
            messenger,
            map,
        }
    }

    /// Run one scan pass. Store and map-save failures are fatal; per-ticket
    /// send failures are not. Re-running with no new customer activity sends
    /// zero additional alerts.
    pub async fn run(&self) -> Result<ScanStats, DomainError> {
        let tickets = self.store.tickets_needing_attention().await?;
        let scanned = tickets.len();

        let mut sent = 0usize;
        for ticket in &tickets {
            let dedup_key = ticket.dedup_key();
            if self.map.is_alerted(&dedup_key).await? {
                debug!(ticket_id = ticket.id, key = %dedup_key, "already alerted, skipping");
                continue;
            }

            match self.messenger.send_alert(ticket).await {
                Ok(message_id) => {
                    self.map.record_sent(message_id, ticket.id).await?;
                    self.map.mark_alerted(&dedup_key).await?;
                    sent += 1;
                    info!(ticket_id = ticket.id, message_id, "Alert sent for Ticket");
                }
                Err(e) => {
                    warn!(ticket_id = ticket.id, error = %e, "alert failed, will retry next run");
                }
            }
        }

        self.map.save().await?;
        info!(scanned, sent, "scan pass complete");

        Ok(ScanStats { scanned, sent })
    }
}

/// Result of a single scan pass.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub scanned: usize,
    pub sent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PendingTicket, TicketStatus};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    fn ticket(id: i64, latest: Option<(&str, i64)>) -> PendingTicket {
        PendingTicket {
            id,
            subject: format!("Subject {}", id),
            description: "Cannot log in".to_string(),
            status: TicketStatus::Pending,
            requester_name: "Jane Roe".to_string(),
            requester_email: "jane@example.com".to_string(),
            latest_message: latest.map(|(m, _)| m.to_string()),
            latest_message_id: latest.map(|(_, mid)| mid),
        }
    }

    struct MockStore {
        tickets: Mutex<Vec<PendingTicket>>,
    }

    #[async_trait::async_trait]
    impl TicketStorePort for MockStore {
        async fn tickets_needing_attention(&self) -> Result<Vec<PendingTicket>, DomainError> {
            Ok(self.tickets.lock().unwrap().clone())
        }

        async fn append_admin_reply(&self, _: i64, _: &str) -> Result<(), DomainError> {
            unreachable!("notifier never writes to the store")
        }

        async fn mark_answered(&self, _: i64) -> Result<(), DomainError> {
            unreachable!("notifier never writes to the store")
        }

        async fn mark_customer_messages_read(&self, _: i64) -> Result<(), DomainError> {
            unreachable!("notifier never writes to the store")
        }
    }

    struct MockMessenger {
        next_message_id: AtomicI64,
        fail_sends: bool,
        alerted_tickets: Mutex<Vec<i64>>,
    }

    impl MockMessenger {
        fn new() -> Self {
            Self {
                next_message_id: AtomicI64::new(5001),
                fail_sends: false,
                alerted_tickets: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl MessengerPort for MockMessenger {
        async fn send_alert(&self, ticket: &PendingTicket) -> Result<i64, DomainError> {
            if self.fail_sends {
                return Err(DomainError::Messenger("network down".to_string()));
            }
            self.alerted_tickets.lock().unwrap().push(ticket.id);
            Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
        }

        async fn send_confirmation(&self, _: i64, _: &str) {}
    }

    #[derive(Default)]
    struct MockMap {
        routes: Mutex<HashMap<i64, i64>>,
        alerted: Mutex<HashSet<String>>,
        saves: AtomicI64,
    }

    #[async_trait::async_trait]
    impl CorrelationPort for MockMap {
        async fn ticket_for_message(&self, message_id: i64) -> Result<Option<i64>, DomainError> {
            Ok(self.routes.lock().unwrap().get(&message_id).copied())
        }

        async fn is_alerted(&self, dedup_key: &str) -> Result<bool, DomainError> {
            Ok(self.alerted.lock().unwrap().contains(dedup_key))
        }

        async fn record_sent(&self, message_id: i64, ticket_id: i64) -> Result<(), DomainError> {
            self.routes.lock().unwrap().insert(message_id, ticket_id);
            Ok(())
        }

        async fn mark_alerted(&self, dedup_key: &str) -> Result<(), DomainError> {
            self.alerted.lock().unwrap().insert(dedup_key.to_string());
            Ok(())
        }

        async fn save(&self) -> Result<(), DomainError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service(
        tickets: Vec<PendingTicket>,
        messenger: MockMessenger,
    ) -> (NotifierService, Arc<MockStore>, Arc<MockMap>, Arc<MockMessenger>) {
        let store = Arc::new(MockStore {
            tickets: Mutex::new(tickets),
        });
        let map = Arc::new(MockMap::default());
        let messenger = Arc::new(messenger);
        let svc = NotifierService::new(
            Arc::clone(&store) as Arc<dyn TicketStorePort>,
            Arc::clone(&messenger) as Arc<dyn MessengerPort>,
            Arc::clone(&map) as Arc<dyn CorrelationPort>,
        );
        (svc, store, map, messenger)
    }

    #[tokio::test]
    async fn test_fresh_ticket_without_messages_is_alerted_once() {
        let (svc, _, map, _) = service(vec![ticket(42, None)], MockMessenger::new());

        let stats = svc.run().await.unwrap();
        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.sent, 1);
        assert!(map.alerted.lock().unwrap().contains("42_initial"));
        // Round-trip: the recorded message id resolves back to the ticket.
        assert_eq!(map.routes.lock().unwrap().get(&5001), Some(&42));
        assert_eq!(map.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_run_with_no_new_activity_sends_nothing() {
        let (svc, _, _, _) = service(
            vec![ticket(42, None), ticket(7, Some(("still broken", 901)))],
            MockMessenger::new(),
        );

        let first = svc.run().await.unwrap();
        assert_eq!(first.sent, 2);

        let second = svc.run().await.unwrap();
        assert_eq!(second.scanned, 2);
        assert_eq!(second.sent, 0);
    }

    #[tokio::test]
    async fn test_new_customer_message_triggers_exactly_one_new_alert() {
        let (svc, store, map, messenger) = service(vec![ticket(42, None)], MockMessenger::new());
        assert_eq!(svc.run().await.unwrap().sent, 1);

        // Customer writes in: the dedup key changes, nothing else does.
        *store.tickets.lock().unwrap() = vec![ticket(42, Some(("any update?", 902)))];

        let stats = svc.run().await.unwrap();
        assert_eq!(stats.sent, 1);
        assert_eq!(*messenger.alerted_tickets.lock().unwrap(), vec![42, 42]);
        assert!(map.alerted.lock().unwrap().contains("42_initial"));
        assert!(map.alerted.lock().unwrap().contains("42_902"));
    }

    #[tokio::test]
    async fn test_failed_send_is_retried_next_run() {
        let mut failing = MockMessenger::new();
        failing.fail_sends = true;
        let (svc, _, map, _) = service(vec![ticket(42, None)], failing);

        let stats = svc.run().await.unwrap();
        assert_eq!(stats.sent, 0);
        // No dedup marker was staged, so the ticket stays eligible.
        assert!(map.alerted.lock().unwrap().is_empty());
        assert!(map.routes.lock().unwrap().is_empty());
    }
}
