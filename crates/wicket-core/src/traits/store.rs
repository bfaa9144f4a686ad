// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence-facing collaborators for tickets, advisors, and notifications.
//!
//! Every method is a single atomic operation against the backing store.
//! The few read-modify-write sequences that can race (numbering, ticket
//! updates, advisor load, notification state) are expressed as dedicated
//! methods so the store can make them atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::advisor::{Advisor, AdvisorStatus, NewAdvisor};
use crate::error::WicketError;
use crate::notification::{NewNotification, Notification};
use crate::queue::QueueType;
use crate::ticket::{NewTicket, Ticket, TicketStatus};
use crate::types::{AdvisorId, NotificationId, TicketId};

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Issues the next number for the ticket's queue type and inserts the
    /// ticket in one atomic step, so numbers are gap-free and never reused.
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, WicketError>;

    async fn find_ticket(&self, id: TicketId) -> Result<Option<Ticket>, WicketError>;

    async fn find_by_number(&self, number: &str) -> Result<Option<Ticket>, WicketError>;

    async fn find_by_reference(&self, reference: Uuid) -> Result<Option<Ticket>, WicketError>;

    /// Active tickets of one queue type in issue order.
    ///
    /// Ids are assigned in the same serialized step as the ticket number, so
    /// id order is number order even when two requests stamp their creation
    /// times out of order.
    async fn list_active_by_queue(&self, queue: QueueType) -> Result<Vec<Ticket>, WicketError>;

    /// Writes the mutable fields if the stored version still matches
    /// `ticket.version`. On success the version is bumped in place and
    /// `true` is returned; a stale write returns `false` and changes nothing.
    async fn save_ticket(&self, ticket: &mut Ticket) -> Result<bool, WicketError>;

    async fn has_active_ticket(&self, national_id: &str) -> Result<bool, WicketError>;

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, WicketError>;

    async fn count_by_status(&self, status: TicketStatus) -> Result<u64, WicketError>;
}

#[async_trait]
pub trait AdvisorStore: Send + Sync {
    async fn create_advisor(&self, advisor: NewAdvisor) -> Result<Advisor, WicketError>;

    async fn find_advisor(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError>;

    async fn find_advisor_by_module(&self, module_number: u32)
    -> Result<Option<Advisor>, WicketError>;

    async fn list_advisors(&self) -> Result<Vec<Advisor>, WicketError>;

    async fn list_advisors_by_status(
        &self,
        status: AdvisorStatus,
    ) -> Result<Vec<Advisor>, WicketError>;

    /// Available advisors ordered by assigned count, then id.
    async fn list_available_by_load(&self) -> Result<Vec<Advisor>, WicketError>;

    async fn find_least_loaded_available(&self) -> Result<Option<Advisor>, WicketError> {
        Ok(self.list_available_by_load().await?.into_iter().next())
    }

    /// Increments the load if the advisor is still Available, flipping it to
    /// Busy at capacity. Returns `None` when the advisor was not Available.
    async fn try_bind(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError>;

    /// Decrements the load (floored at 0), flipping Busy back to Available
    /// below capacity. Returns `None` for an unknown advisor.
    async fn release(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError>;

    /// Administrative status change. `Available` is re-derived to `Busy`
    /// when the advisor is already at capacity.
    async fn set_advisor_status(
        &self,
        id: AdvisorId,
        status: AdvisorStatus,
    ) -> Result<Option<Advisor>, WicketError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Inserts a Pending notice unless the ticket already has a Pending or
    /// Sent notice with the same template. Returns `None` for a duplicate.
    async fn insert_notification_if_absent(
        &self,
        notification: NewNotification,
    ) -> Result<Option<Notification>, WicketError>;

    async fn find_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, WicketError>;

    async fn list_for_ticket(&self, ticket_id: TicketId)
    -> Result<Vec<Notification>, WicketError>;

    /// Pending notices due at `now` that have never been attempted.
    async fn list_pending_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, WicketError>;

    /// Pending notices due at `now` with at least one failed attempt and
    /// fewer than `max_attempts`.
    async fn list_retry_due(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<Notification>, WicketError>;

    /// Pending -> Sent. Returns `false` if the notice was no longer Pending.
    async fn mark_sent(
        &self,
        id: NotificationId,
        sent_at: DateTime<Utc>,
        transport_message_id: &str,
    ) -> Result<bool, WicketError>;

    /// Counts one failed attempt. Reaching `max_attempts` marks the notice
    /// Failed, otherwise it stays Pending and moves to `retry_at`. Returns
    /// `None` if the notice was no longer Pending.
    async fn record_failed_attempt(
        &self,
        id: NotificationId,
        retry_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Option<Notification>, WicketError>;

    /// Marks every Pending notice of the ticket Failed without delivery.
    /// Returns how many were cancelled.
    async fn cancel_pending_for_ticket(&self, ticket_id: TicketId) -> Result<u64, WicketError>;

    /// Marks Failed every Pending notice whose attempts already reach
    /// `max_attempts`. Such rows only exist after the cap was lowered.
    async fn fail_exhausted(&self, max_attempts: u32) -> Result<u64, WicketError>;
}
