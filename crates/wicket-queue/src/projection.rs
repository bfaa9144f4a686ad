// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-facing view of where a ticket stands.

use serde::Serialize;

use wicket_core::{QueueType, Ticket, TicketStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub ticket_number: String,
    pub queue_type: QueueType,
    pub status: TicketStatus,
    pub position_in_queue: u32,
    pub estimated_wait_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_number: Option<u32>,
    pub message: String,
}

impl PositionView {
    pub fn of(ticket: &Ticket) -> Self {
        let message = match ticket.status {
            TicketStatus::Waiting => format!(
                "Your ticket is in line. Position: {}, estimated wait: {} minutes.",
                ticket.position, ticket.estimated_wait_minutes
            ),
            TicketStatus::Next => "Your turn is near. Please get ready to be served.".to_string(),
            TicketStatus::InService => match ticket.module_number {
                Some(module) => format!("You are being served at module {module}."),
                None => "You are being served.".to_string(),
            },
            TicketStatus::Completed => "This ticket has been completed.".to_string(),
            TicketStatus::Cancelled => "This ticket was cancelled.".to_string(),
            TicketStatus::NoShow => "This ticket was closed because nobody answered the call.".to_string(),
        };

        Self {
            ticket_number: ticket.number.clone(),
            queue_type: ticket.queue_type,
            status: ticket.status,
            position_in_queue: ticket.position,
            estimated_wait_minutes: ticket.estimated_wait_minutes,
            module_number: ticket.module_number.filter(|_| ticket.status == TicketStatus::InService),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use wicket_core::{AdvisorId, NewTicket, TicketId, TicketRequest};

    use super::*;

    fn ticket() -> Ticket {
        NewTicket::new(
            TicketRequest {
                national_id: "12345678".into(),
                phone: None,
                branch_office: "Centro".into(),
                queue_type: QueueType::Caja,
            },
            4,
            Utc::now(),
        )
        .into_ticket(TicketId(4), "C04".into())
    }

    #[test]
    fn waiting_view_reports_position_and_eta() {
        let view = PositionView::of(&ticket());
        assert_eq!(view.position_in_queue, 4);
        assert_eq!(view.estimated_wait_minutes, 20);
        assert!(view.message.contains("Position: 4"));
        assert!(view.module_number.is_none());
    }

    #[test]
    fn in_service_view_names_the_module() {
        let mut t = ticket();
        t.transition_to(TicketStatus::InService).unwrap();
        t.advisor_id = Some(AdvisorId(1));
        t.module_number = Some(3);

        let view = PositionView::of(&t);
        assert_eq!(view.position_in_queue, 0);
        assert_eq!(view.module_number, Some(3));
        assert!(view.message.contains("module 3"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["ticketNumber"], "C04");
        assert_eq!(json["status"], "IN_SERVICE");
        assert_eq!(json["moduleNumber"], 3);
    }
}
