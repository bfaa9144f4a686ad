// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message text for each notification template.
//!
//! Rendered at delivery time from the ticket's current fields, so a
//! "ticket created" notice sent a minute late shows the position the
//! client holds now.

use wicket_core::{NotificationTemplate, Ticket};

pub fn render(template: NotificationTemplate, ticket: &Ticket) -> String {
    match template {
        NotificationTemplate::TicketCreated => format!(
            "Ticket {number} created\n\
             Queue: {queue}\n\
             Position: {position}\n\
             Estimated wait: {eta} minutes\n\n\
             We will notify you when it is your turn.",
            number = ticket.number,
            queue = ticket.queue_type.display_name(),
            position = ticket.position,
            eta = ticket.estimated_wait_minutes,
        ),
        NotificationTemplate::NextTurn => format!(
            "Ticket {number}: you are next\n\n\
             Please approach the waiting area.",
            number = ticket.number,
        ),
        NotificationTemplate::YourTurn => match ticket.module_number {
            Some(module) => format!(
                "Ticket {number}: it is your turn\n\
                 Module: {module}\n\n\
                 Please go to the service module.",
                number = ticket.number,
            ),
            None => format!(
                "Ticket {number}: it is your turn\n\n\
                 Please go to the service desk.",
                number = ticket.number,
            ),
        },
    }
}
