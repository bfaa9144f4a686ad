// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only aggregate over tickets and advisors for staff screens.

use chrono::{DateTime, Utc};
use serde::Serialize;

use wicket_core::{Advisor, AdvisorStatus, QueueType, Ticket, TicketStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_tickets_today: u64,
    pub tickets_in_queue: u64,
    pub tickets_completed: u64,
    pub available_advisors: u64,
    pub busy_advisors: u64,
    pub offline_advisors: u64,
    /// Mean ETA over every queued (Waiting or Next) ticket.
    pub average_wait_minutes: f64,
    pub queues: Vec<QueueStatus>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_type: QueueType,
    pub display_name: &'static str,
    pub active: u64,
    pub waiting: u64,
    pub next: u64,
    pub in_service: u64,
    pub average_wait_minutes: f64,
    /// The queued ticket that will be called first, if any.
    pub next_ticket_number: Option<String>,
}

impl QueueStatus {
    /// `active` holds one queue's active tickets in creation order.
    pub fn from_active(queue_type: QueueType, active: &[Ticket]) -> Self {
        let count = |status| active.iter().filter(|t| t.status == status).count() as u64;
        let queued: Vec<&Ticket> = active.iter().filter(|t| t.status.is_queued()).collect();

        Self {
            queue_type,
            display_name: queue_type.display_name(),
            active: active.len() as u64,
            waiting: count(TicketStatus::Waiting),
            next: count(TicketStatus::Next),
            in_service: count(TicketStatus::InService),
            average_wait_minutes: mean(queued.iter().map(|t| t.estimated_wait_minutes)),
            next_ticket_number: queued
                .iter()
                .min_by_key(|t| (t.position, t.created_at, t.id))
                .map(|t| t.number.clone()),
        }
    }
}

/// Counts the caller gathered from the ticket store.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketCounts {
    pub created_today: u64,
    pub completed: u64,
}

impl Dashboard {
    pub fn assemble(
        counts: TicketCounts,
        active_by_queue: &[(QueueType, Vec<Ticket>)],
        advisors: &[Advisor],
        now: DateTime<Utc>,
    ) -> Self {
        let advisors_in = |status| advisors.iter().filter(|a| a.status == status).count() as u64;
        let queued_etas = active_by_queue
            .iter()
            .flat_map(|(_, tickets)| tickets.iter())
            .filter(|t| t.status.is_queued())
            .map(|t| t.estimated_wait_minutes);

        Self {
            total_tickets_today: counts.created_today,
            tickets_in_queue: active_by_queue
                .iter()
                .map(|(_, tickets)| tickets.len() as u64)
                .sum(),
            tickets_completed: counts.completed,
            available_advisors: advisors_in(AdvisorStatus::Available),
            busy_advisors: advisors_in(AdvisorStatus::Busy),
            offline_advisors: advisors_in(AdvisorStatus::Offline),
            average_wait_minutes: mean(queued_etas),
            queues: active_by_queue
                .iter()
                .map(|(queue, tickets)| QueueStatus::from_active(*queue, tickets))
                .collect(),
            last_updated: now,
        }
    }
}

fn mean(values: impl Iterator<Item = u32>) -> f64 {
    let (sum, n) = values.fold((0u64, 0u64), |(s, n), v| (s + u64::from(v), n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}

#[cfg(test)]
mod tests {
    use wicket_core::{NewTicket, TicketId, TicketRequest};

    use super::*;

    fn ticket(id: i64, position: u32, status: TicketStatus) -> Ticket {
        let mut t = NewTicket::new(
            TicketRequest {
                national_id: "12345678".into(),
                phone: None,
                branch_office: "Centro".into(),
                queue_type: QueueType::Caja,
            },
            position,
            Utc::now(),
        )
        .into_ticket(TicketId(id), format!("C{id:02}"));
        t.status = status;
        if status == TicketStatus::InService {
            t.position = 0;
            t.estimated_wait_minutes = 0;
        }
        t
    }

    #[test]
    fn queue_status_counts_and_next_number() {
        let active = vec![
            ticket(1, 0, TicketStatus::InService),
            ticket(2, 1, TicketStatus::Next),
            ticket(3, 2, TicketStatus::Waiting),
        ];
        let status = QueueStatus::from_active(QueueType::Caja, &active);
        assert_eq!(status.active, 3);
        assert_eq!(status.in_service, 1);
        assert_eq!(status.next, 1);
        assert_eq!(status.waiting, 1);
        assert_eq!(status.next_ticket_number.as_deref(), Some("C02"));
        assert!((status.average_wait_minutes - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_dashboard_has_zero_averages() {
        let queues: Vec<(QueueType, Vec<Ticket>)> =
            QueueType::ALL.iter().map(|q| (*q, Vec::new())).collect();
        let dashboard = Dashboard::assemble(TicketCounts::default(), &queues, &[], Utc::now());
        assert_eq!(dashboard.tickets_in_queue, 0);
        assert_eq!(dashboard.average_wait_minutes, 0.0);
        assert_eq!(dashboard.queues.len(), 4);
        assert!(dashboard.queues.iter().all(|q| q.next_ticket_number.is_none()));
    }
}
