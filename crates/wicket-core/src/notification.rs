// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification records and their delivery state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{NotificationId, TicketId};

/// Delivery status. `Pending -> Sent | Pending | Failed`; Sent and Failed are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationTemplate {
    TicketCreated,
    NextTurn,
    YourTurn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub ticket_id: TicketId,
    pub template: NotificationTemplate,
    pub status: NotificationStatus,
    pub scheduled_at: DateTime<Utc>,
    /// Failed delivery attempts so far; a successful send does not count.
    pub attempts: u32,
    pub sent_at: Option<DateTime<Utc>>,
    pub transport_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A notice about to be scheduled. Starts Pending with zero attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub ticket_id: TicketId,
    pub template: NotificationTemplate,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn into_notification(self, id: NotificationId) -> Notification {
        Notification {
            id,
            ticket_id: self.ticket_id,
            template: self.template,
            status: NotificationStatus::Pending,
            scheduled_at: self.scheduled_at,
            attempts: 0,
            sent_at: None,
            transport_message_id: None,
            created_at: self.created_at,
        }
    }
}
