// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON projections returned by the API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use wicket_core::{Advisor, AdvisorId, AdvisorStatus, QueueType, Ticket, TicketId, TicketStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: TicketId,
    pub reference_code: Uuid,
    pub ticket_number: String,
    pub national_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub branch_office: String,
    pub queue_type: QueueType,
    pub status: TicketStatus,
    pub position_in_queue: u32,
    pub estimated_wait_minutes: u32,
    pub assigned_advisor_id: Option<AdvisorId>,
    pub assigned_module_number: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketView {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            reference_code: t.reference,
            ticket_number: t.number,
            national_id: t.national_id,
            phone: t.phone,
            branch_office: t.branch_office,
            queue_type: t.queue_type,
            status: t.status,
            position_in_queue: t.position,
            estimated_wait_minutes: t.estimated_wait_minutes,
            assigned_advisor_id: t.advisor_id,
            assigned_module_number: t.module_number,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorView {
    pub id: AdvisorId,
    pub name: String,
    pub email: String,
    pub status: AdvisorStatus,
    pub module_number: u32,
    pub assigned_tickets_count: u32,
    pub capacity: u32,
}

impl From<Advisor> for AdvisorView {
    fn from(a: Advisor) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            status: a.status,
            module_number: a.module_number,
            assigned_tickets_count: a.assigned_tickets,
            capacity: a.capacity,
        }
    }
}
