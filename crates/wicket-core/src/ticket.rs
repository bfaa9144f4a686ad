// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket entity and its lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::WicketError;
use crate::queue::QueueType;
use crate::types::{AdvisorId, TicketId};

/// Lifecycle status of a ticket.
///
/// `Waiting`, `Next` and `InService` are active and take part in queue
/// depth and position math. The rest are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Waiting,
    Next,
    InService,
    Completed,
    Cancelled,
    NoShow,
}

impl TicketStatus {
    pub const ACTIVE: [TicketStatus; 3] = [
        TicketStatus::Waiting,
        TicketStatus::Next,
        TicketStatus::InService,
    ];

    pub fn is_active(self) -> bool {
        matches!(
            self,
            TicketStatus::Waiting | TicketStatus::Next | TicketStatus::InService
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Whether a ticket in this status still holds a place in the line
    /// (ranked by position rather than being served).
    pub fn is_queued(self) -> bool {
        matches!(self, TicketStatus::Waiting | TicketStatus::Next)
    }

    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        match (self, next) {
            (Waiting, Next) => true,
            // Assignment may bind a Waiting ticket when nobody is Next.
            (Waiting | Next, InService) => true,
            (InService, Completed) => true,
            (Waiting | Next | InService, Cancelled) => true,
            (Next | InService, NoShow) => true,
            (Waiting, _) | (Next, _) | (InService, _) => false,
            (Completed, _) | (Cancelled, _) | (NoShow, _) => false,
        }
    }
}

/// A client's place in a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub reference: Uuid,
    pub number: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub branch_office: String,
    pub queue_type: QueueType,
    pub status: TicketStatus,
    pub position: u32,
    pub estimated_wait_minutes: u32,
    pub advisor_id: Option<AdvisorId>,
    pub module_number: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every save.
    pub version: i64,
}

impl Ticket {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Moves the ticket to `next`, rejecting transitions the lifecycle forbids.
    pub fn transition_to(&mut self, next: TicketStatus) -> Result<(), WicketError> {
        if !self.status.can_transition_to(next) {
            return Err(WicketError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next.is_terminal() || next == TicketStatus::InService {
            self.position = 0;
            self.estimated_wait_minutes = 0;
        }
        Ok(())
    }

    /// Notification recipient: the phone with every non-digit removed.
    pub fn recipient(&self) -> Option<String> {
        let digits: String = self
            .phone
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        (!digits.is_empty()).then_some(digits)
    }
}

/// A ticket about to be created. The store assigns the id and number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub reference: Uuid,
    pub national_id: String,
    pub phone: Option<String>,
    pub branch_office: String,
    pub queue_type: QueueType,
    pub position: u32,
    pub estimated_wait_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl NewTicket {
    /// Stamps a fresh reference code and creation time; status starts as `Waiting`.
    pub fn new(request: TicketRequest, position: u32, now: DateTime<Utc>) -> Self {
        Self {
            reference: Uuid::new_v4(),
            national_id: request.national_id,
            phone: request.phone,
            branch_office: request.branch_office,
            queue_type: request.queue_type,
            position,
            estimated_wait_minutes: request.queue_type.eta_minutes(position),
            created_at: now,
        }
    }

    /// Materializes the stored row once the store has issued identity.
    pub fn into_ticket(self, id: TicketId, number: String) -> Ticket {
        Ticket {
            id,
            reference: self.reference,
            number,
            national_id: self.national_id,
            phone: self.phone,
            branch_office: self.branch_office,
            queue_type: self.queue_type,
            status: TicketStatus::Waiting,
            position: self.position,
            estimated_wait_minutes: self.estimated_wait_minutes,
            advisor_id: None,
            module_number: None,
            created_at: self.created_at,
            updated_at: self.created_at,
            version: 0,
        }
    }
}

/// A validated request to join a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    pub national_id: String,
    pub phone: Option<String>,
    pub branch_office: String,
    pub queue_type: QueueType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: TicketStatus) -> Ticket {
        let request = TicketRequest {
            national_id: "12345678".into(),
            phone: Some("+56 9 1234-5678".into()),
            branch_office: "Centro".into(),
            queue_type: QueueType::Caja,
        };
        let mut ticket =
            NewTicket::new(request, 2, Utc::now()).into_ticket(TicketId(1), "C01".into());
        ticket.status = status;
        ticket
    }

    #[test]
    fn new_ticket_starts_waiting_with_eta() {
        let ticket = sample(TicketStatus::Waiting);
        assert_eq!(ticket.status, TicketStatus::Waiting);
        assert_eq!(ticket.position, 2);
        assert_eq!(ticket.estimated_wait_minutes, 10);
        assert_eq!(ticket.version, 0);
    }

    #[test]
    fn recipient_strips_non_digits() {
        assert_eq!(
            sample(TicketStatus::Waiting).recipient().as_deref(),
            Some("56912345678")
        );
        let mut ticket = sample(TicketStatus::Waiting);
        ticket.phone = Some("+".into());
        assert_eq!(ticket.recipient(), None);
        ticket.phone = None;
        assert_eq!(ticket.recipient(), None);
    }

    #[test]
    fn lifecycle_allows_forward_path() {
        let mut ticket = sample(TicketStatus::Waiting);
        ticket.transition_to(TicketStatus::Next).unwrap();
        ticket.transition_to(TicketStatus::InService).unwrap();
        assert_eq!(ticket.position, 0);
        assert_eq!(ticket.estimated_wait_minutes, 0);
        ticket.transition_to(TicketStatus::Completed).unwrap();
        assert!(ticket.status.is_terminal());
    }

    #[test]
    fn waiting_may_jump_to_in_service() {
        assert!(TicketStatus::Waiting.can_transition_to(TicketStatus::InService));
    }

    #[test]
    fn terminal_statuses_are_immutable() {
        for terminal in [
            TicketStatus::Completed,
            TicketStatus::Cancelled,
            TicketStatus::NoShow,
        ] {
            for next in [
                TicketStatus::Waiting,
                TicketStatus::Next,
                TicketStatus::InService,
                TicketStatus::Completed,
                TicketStatus::Cancelled,
                TicketStatus::NoShow,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn backward_transition_is_rejected() {
        let mut ticket = sample(TicketStatus::InService);
        let err = ticket.transition_to(TicketStatus::Waiting).unwrap_err();
        assert!(matches!(err, WicketError::InvalidTransition { .. }));
        assert_eq!(ticket.status, TicketStatus::InService);
    }

    #[test]
    fn completion_requires_service() {
        assert!(!TicketStatus::Waiting.can_transition_to(TicketStatus::Completed));
        assert!(TicketStatus::Waiting.can_transition_to(TicketStatus::Cancelled));
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(TicketStatus::InService.to_string(), "IN_SERVICE");
        assert_eq!(
            "NO_SHOW".parse::<TicketStatus>().unwrap(),
            TicketStatus::NoShow
        );
    }
}
