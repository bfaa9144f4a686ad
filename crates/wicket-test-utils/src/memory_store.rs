// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of the three store traits.
//!
//! All state sits behind one async mutex, so every method is atomic in the
//! same way the SQLite queries are. The conditional updates (versioned
//! save, guarded bind, status-guarded notification changes) follow the SQL
//! semantics exactly.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use wicket_core::{
    Advisor, AdvisorId, AdvisorStatus, AdvisorStore, NewAdvisor, NewNotification, NewTicket,
    Notification, NotificationId, NotificationStatus, NotificationStore, QueueType, Ticket,
    TicketId, TicketStatus, TicketStore, WicketError,
};

#[derive(Default)]
struct State {
    tickets: BTreeMap<TicketId, Ticket>,
    counters: HashMap<QueueType, u32>,
    advisors: BTreeMap<AdvisorId, Advisor>,
    notifications: BTreeMap<NotificationId, Notification>,
    next_ticket: i64,
    next_advisor: i64,
    next_notification: i64,
}

/// Store used by unit and integration tests in place of SQLite.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps a ticket's version without changing it, as a concurrent writer
    /// would. The next save of a copy read earlier is rejected.
    pub async fn touch_ticket(&self, id: TicketId) {
        if let Some(ticket) = self.state.lock().await.tickets.get_mut(&id) {
            ticket.version += 1;
        }
    }

    pub async fn all_tickets(&self) -> Vec<Ticket> {
        self.state.lock().await.tickets.values().cloned().collect()
    }

    pub async fn all_notifications(&self) -> Vec<Notification> {
        self.state
            .lock()
            .await
            .notifications
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, WicketError> {
        let mut state = self.state.lock().await;
        let sequence = state.counters.entry(ticket.queue_type).or_insert(0);
        *sequence += 1;
        let number = ticket.queue_type.format_number(*sequence);

        state.next_ticket += 1;
        let ticket = ticket.into_ticket(TicketId(state.next_ticket), number);
        state.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn find_ticket(&self, id: TicketId) -> Result<Option<Ticket>, WicketError> {
        Ok(self.state.lock().await.tickets.get(&id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Ticket>, WicketError> {
        let state = self.state.lock().await;
        Ok(state.tickets.values().find(|t| t.number == number).cloned())
    }

    async fn find_by_reference(&self, reference: Uuid) -> Result<Option<Ticket>, WicketError> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .values()
            .find(|t| t.reference == reference)
            .cloned())
    }

    async fn list_active_by_queue(&self, queue: QueueType) -> Result<Vec<Ticket>, WicketError> {
        let state = self.state.lock().await;
        let mut active: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.queue_type == queue && t.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|t| t.id);
        Ok(active)
    }

    async fn save_ticket(&self, ticket: &mut Ticket) -> Result<bool, WicketError> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.tickets.get_mut(&ticket.id) else {
            return Ok(false);
        };
        if stored.version != ticket.version {
            return Ok(false);
        }
        ticket.version += 1;
        *stored = ticket.clone();
        Ok(true)
    }

    async fn has_active_ticket(&self, national_id: &str) -> Result<bool, WicketError> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .values()
            .any(|t| t.national_id == national_id && t.is_active()))
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, WicketError> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.created_at >= since)
            .count() as u64)
    }

    async fn count_by_status(&self, status: TicketStatus) -> Result<u64, WicketError> {
        let state = self.state.lock().await;
        Ok(state.tickets.values().filter(|t| t.status == status).count() as u64)
    }
}

#[async_trait]
impl AdvisorStore for MemoryStore {
    async fn create_advisor(&self, advisor: NewAdvisor) -> Result<Advisor, WicketError> {
        let mut state = self.state.lock().await;
        if state
            .advisors
            .values()
            .any(|a| a.module_number == advisor.module_number)
        {
            return Err(WicketError::Conflict(format!(
                "module {} already has an advisor",
                advisor.module_number
            )));
        }
        state.next_advisor += 1;
        let advisor = advisor.into_advisor(AdvisorId(state.next_advisor));
        state.advisors.insert(advisor.id, advisor.clone());
        Ok(advisor)
    }

    async fn find_advisor(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
        Ok(self.state.lock().await.advisors.get(&id).cloned())
    }

    async fn find_advisor_by_module(
        &self,
        module_number: u32,
    ) -> Result<Option<Advisor>, WicketError> {
        let state = self.state.lock().await;
        Ok(state
            .advisors
            .values()
            .find(|a| a.module_number == module_number)
            .cloned())
    }

    async fn list_advisors(&self) -> Result<Vec<Advisor>, WicketError> {
        Ok(self.state.lock().await.advisors.values().cloned().collect())
    }

    async fn list_advisors_by_status(
        &self,
        status: AdvisorStatus,
    ) -> Result<Vec<Advisor>, WicketError> {
        let state = self.state.lock().await;
        Ok(state
            .advisors
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect())
    }

    async fn list_available_by_load(&self) -> Result<Vec<Advisor>, WicketError> {
        let state = self.state.lock().await;
        let mut available: Vec<Advisor> = state
            .advisors
            .values()
            .filter(|a| a.status == AdvisorStatus::Available && !a.is_full())
            .cloned()
            .collect();
        available.sort_by_key(|a| (a.assigned_tickets, a.id));
        Ok(available)
    }

    async fn try_bind(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
        let mut state = self.state.lock().await;
        let Some(advisor) = state.advisors.get_mut(&id) else {
            return Ok(None);
        };
        if advisor.status != AdvisorStatus::Available || advisor.is_full() {
            return Ok(None);
        }
        advisor.assigned_tickets += 1;
        advisor.status = Advisor::load_status(advisor.assigned_tickets, advisor.capacity);
        advisor.updated_at = Utc::now();
        Ok(Some(advisor.clone()))
    }

    async fn release(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
        let mut state = self.state.lock().await;
        let Some(advisor) = state.advisors.get_mut(&id) else {
            return Ok(None);
        };
        advisor.assigned_tickets = advisor.assigned_tickets.saturating_sub(1);
        if advisor.status == AdvisorStatus::Busy && !advisor.is_full() {
            advisor.status = AdvisorStatus::Available;
        }
        advisor.updated_at = Utc::now();
        Ok(Some(advisor.clone()))
    }

    async fn set_advisor_status(
        &self,
        id: AdvisorId,
        status: AdvisorStatus,
    ) -> Result<Option<Advisor>, WicketError> {
        let mut state = self.state.lock().await;
        let Some(advisor) = state.advisors.get_mut(&id) else {
            return Ok(None);
        };
        advisor.status = match status {
            AdvisorStatus::Offline => AdvisorStatus::Offline,
            AdvisorStatus::Available | AdvisorStatus::Busy => {
                Advisor::load_status(advisor.assigned_tickets, advisor.capacity)
            }
        };
        advisor.updated_at = Utc::now();
        Ok(Some(advisor.clone()))
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification_if_absent(
        &self,
        notification: NewNotification,
    ) -> Result<Option<Notification>, WicketError> {
        let mut state = self.state.lock().await;
        let live = state.notifications.values().any(|n| {
            n.ticket_id == notification.ticket_id
                && n.template == notification.template
                && matches!(
                    n.status,
                    NotificationStatus::Pending | NotificationStatus::Sent
                )
        });
        if live {
            return Ok(None);
        }
        state.next_notification += 1;
        let notification = notification.into_notification(NotificationId(state.next_notification));
        state
            .notifications
            .insert(notification.id, notification.clone());
        Ok(Some(notification))
    }

    async fn find_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, WicketError> {
        Ok(self.state.lock().await.notifications.get(&id).cloned())
    }

    async fn list_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Notification>, WicketError> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn list_pending_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, WicketError> {
        let state = self.state.lock().await;
        let mut due: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| {
                n.status == NotificationStatus::Pending && n.attempts == 0 && n.scheduled_at <= now
            })
            .cloned()
            .collect();
        due.sort_by_key(|n| (n.scheduled_at, n.id));
        Ok(due)
    }

    async fn list_retry_due(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<Notification>, WicketError> {
        let state = self.state.lock().await;
        let mut due: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| {
                n.status == NotificationStatus::Pending
                    && n.attempts > 0
                    && n.attempts < max_attempts
                    && n.scheduled_at <= now
            })
            .cloned()
            .collect();
        due.sort_by_key(|n| (n.scheduled_at, n.id));
        Ok(due)
    }

    async fn mark_sent(
        &self,
        id: NotificationId,
        sent_at: DateTime<Utc>,
        transport_message_id: &str,
    ) -> Result<bool, WicketError> {
        let mut state = self.state.lock().await;
        match state.notifications.get_mut(&id) {
            Some(n) if n.status == NotificationStatus::Pending => {
                n.status = NotificationStatus::Sent;
                n.sent_at = Some(sent_at);
                n.transport_message_id = Some(transport_message_id.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_failed_attempt(
        &self,
        id: NotificationId,
        retry_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Option<Notification>, WicketError> {
        let mut state = self.state.lock().await;
        match state.notifications.get_mut(&id) {
            Some(n) if n.status == NotificationStatus::Pending => {
                n.attempts = (n.attempts + 1).min(max_attempts);
                if n.attempts >= max_attempts {
                    n.status = NotificationStatus::Failed;
                } else {
                    n.scheduled_at = retry_at;
                }
                Ok(Some(n.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn cancel_pending_for_ticket(&self, ticket_id: TicketId) -> Result<u64, WicketError> {
        let mut state = self.state.lock().await;
        let mut cancelled = 0;
        for n in state.notifications.values_mut() {
            if n.ticket_id == ticket_id && n.status == NotificationStatus::Pending {
                n.status = NotificationStatus::Failed;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn fail_exhausted(&self, max_attempts: u32) -> Result<u64, WicketError> {
        let mut state = self.state.lock().await;
        let mut failed = 0;
        for n in state.notifications.values_mut() {
            if n.status == NotificationStatus::Pending && n.attempts >= max_attempts {
                n.status = NotificationStatus::Failed;
                failed += 1;
            }
        }
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use wicket_core::TicketRequest;

    use super::*;

    fn new_ticket(queue: QueueType) -> NewTicket {
        NewTicket::new(
            TicketRequest {
                national_id: "11111111".into(),
                phone: None,
                branch_office: "Centro".into(),
                queue_type: queue,
            },
            1,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn stale_save_is_rejected_after_touch() {
        let store = MemoryStore::new();
        let mut ticket = store.create_ticket(new_ticket(QueueType::Caja)).await.unwrap();
        assert_eq!(ticket.number, "C01");

        store.touch_ticket(ticket.id).await;
        ticket.status = TicketStatus::Next;
        assert!(!store.save_ticket(&mut ticket).await.unwrap());
    }

    #[tokio::test]
    async fn bind_respects_status_and_capacity() {
        let store = MemoryStore::new();
        let advisor = store
            .create_advisor(NewAdvisor {
                name: "Ana".into(),
                email: String::new(),
                module_number: 1,
                capacity: 1,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let bound = store.try_bind(advisor.id).await.unwrap().unwrap();
        assert_eq!(bound.status, AdvisorStatus::Busy);
        assert!(store.try_bind(advisor.id).await.unwrap().is_none());
        let released = store.release(advisor.id).await.unwrap().unwrap();
        assert_eq!(released.status, AdvisorStatus::Available);
        assert_eq!(released.assigned_tickets, 0);
    }
}
