// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket issuance, position recomputation and advisor assignment.
//!
//! Every ticket write goes through [`TicketStore::save_ticket`], which
//! rejects a write whose version is stale. A tick that loses such a race
//! skips the ticket and the next tick reconciles it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use wicket_config::model::QueueConfig;
use wicket_core::{
    Advisor, Clock, NewTicket, NotificationTemplate, PeriodicTask, QueueType, Ticket, TicketId,
    TicketStatus, TicketStore, WicketError,
};
use wicket_notify::NotificationDispatcher;

use crate::dashboard::{Dashboard, TicketCounts};
use crate::pool::AdvisorPool;
use crate::projection::PositionView;
use crate::validation::CreateTicket;

/// What one queue tick changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tickets whose position or ETA moved.
    pub repositioned: u64,
    /// Waiting tickets moved to Next.
    pub promoted: u64,
    pub assigned: u64,
    /// Writes rejected because the ticket changed under the tick.
    pub stale: u64,
}

pub struct QueueCoordinator {
    tickets: Arc<dyn TicketStore>,
    pool: Arc<AdvisorPool>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    config: QueueConfig,
}

impl QueueCoordinator {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        pool: Arc<AdvisorPool>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: QueueConfig,
    ) -> Self {
        Self {
            tickets,
            pool,
            dispatcher,
            clock,
            config,
        }
    }

    pub fn pool(&self) -> &Arc<AdvisorPool> {
        &self.pool
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    /// Issues a Waiting ticket at the back of its queue.
    ///
    /// The number comes from the store's per-queue counter. The position
    /// counts every active ticket ahead, including those being served, and
    /// is a snapshot: tickets created concurrently may share one until the
    /// next tick renumbers the queue.
    pub async fn create_ticket(&self, request: CreateTicket) -> Result<Ticket, WicketError> {
        let request = request.validate()?;

        if self.config.one_active_ticket_per_client
            && self.tickets.has_active_ticket(&request.national_id).await?
        {
            return Err(WicketError::Conflict(
                "client already holds an active ticket".to_string(),
            ));
        }

        let queue = request.queue_type;
        let ahead = self.tickets.list_active_by_queue(queue).await?.len();
        let position = u32::try_from(ahead).unwrap_or(u32::MAX).saturating_add(1);

        let ticket = self
            .tickets
            .create_ticket(NewTicket::new(request, position, self.clock.now()))
            .await?;

        info!(
            ticket = %ticket.number,
            queue = %queue,
            position = ticket.position,
            eta_minutes = ticket.estimated_wait_minutes,
            "ticket created"
        );
        wicket_prometheus::record_ticket_created(&queue.to_string());
        self.notify(&ticket, NotificationTemplate::TicketCreated)
            .await;

        Ok(ticket)
    }

    /// Renumbers every queue, promotes the head of each queue to Next and
    /// binds queued tickets to free advisors.
    ///
    /// Next tickets from every queue are served before any Waiting ticket.
    /// Within each status, queues go in priority order and tickets in issue
    /// order.
    pub async fn tick(&self) -> Result<TickReport, WicketError> {
        let mut report = TickReport::default();

        let mut candidates = Vec::new();
        for queue in QueueType::ALL {
            candidates.extend(self.rank_queue(queue, &mut report).await?);
        }
        candidates.sort_by_key(|t| (t.status != TicketStatus::Next, t.queue_type, t.id));

        let touched = self.assign(candidates, &mut report).await?;

        // Assignment leaves a hole at the front of each served queue.
        for queue in touched {
            self.rank_queue(queue, &mut report).await?;
        }

        Ok(report)
    }

    /// Recomputes positions and promotions for one queue. Returns the
    /// queued tickets whose stored version matches the returned value.
    ///
    /// Positions are 1-based over all active tickets in issue order, so a
    /// ticket being served still counts for those behind it while its own
    /// position stays 0.
    async fn rank_queue(
        &self,
        queue: QueueType,
        report: &mut TickReport,
    ) -> Result<Vec<Ticket>, WicketError> {
        let active = self.tickets.list_active_by_queue(queue).await?;
        wicket_prometheus::set_active_tickets(&queue.to_string(), active.len() as f64);

        let now = self.clock.now();
        let mut queued = Vec::with_capacity(active.len());

        for (index, mut ticket) in active.into_iter().enumerate() {
            if !ticket.status.is_queued() {
                continue;
            }
            let rank = u32::try_from(index + 1).unwrap_or(u32::MAX);

            let eta = queue.eta_minutes(rank);
            let moved = ticket.position != rank || ticket.estimated_wait_minutes != eta;
            let promote =
                ticket.status == TicketStatus::Waiting && rank <= self.config.promotion_threshold;
            if !moved && !promote {
                queued.push(ticket);
                continue;
            }

            ticket.position = rank;
            ticket.estimated_wait_minutes = eta;
            if promote {
                ticket.transition_to(TicketStatus::Next)?;
            }
            ticket.updated_at = now;

            if !self.tickets.save_ticket(&mut ticket).await? {
                debug!(ticket = %ticket.number, "ticket changed during tick, skipped");
                report.stale += 1;
                continue;
            }

            if moved {
                report.repositioned += 1;
            }
            if promote {
                report.promoted += 1;
                info!(ticket = %ticket.number, position = rank, "ticket promoted to next");
                self.notify(&ticket, NotificationTemplate::NextTurn).await;
            }
            queued.push(ticket);
        }

        Ok(queued)
    }

    /// Walks the candidates in priority order, giving each one the next
    /// least-loaded advisor. An advisor is offered at most once per tick.
    async fn assign(
        &self,
        candidates: Vec<Ticket>,
        report: &mut TickReport,
    ) -> Result<BTreeSet<QueueType>, WicketError> {
        let mut touched = BTreeSet::new();
        if candidates.is_empty() {
            return Ok(touched);
        }

        let mut advisors = self.pool.available_by_load().await?.into_iter();

        for mut ticket in candidates {
            if !ticket.status.can_transition_to(TicketStatus::InService) {
                continue;
            }
            let Some(advisor) = self.bind_next(&mut advisors).await? else {
                break;
            };

            ticket.transition_to(TicketStatus::InService)?;
            ticket.advisor_id = Some(advisor.id);
            ticket.module_number = Some(advisor.module_number);
            ticket.updated_at = self.clock.now();

            match self.tickets.save_ticket(&mut ticket).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(ticket = %ticket.number, advisor_id = %advisor.id, "ticket changed before assignment, advisor returned");
                    report.stale += 1;
                    self.release_quietly(&advisor, &ticket).await;
                    continue;
                }
                Err(e) => {
                    self.release_quietly(&advisor, &ticket).await;
                    return Err(e);
                }
            }

            info!(
                ticket = %ticket.number,
                advisor_id = %advisor.id,
                module = advisor.module_number,
                advisor_load = advisor.assigned_tickets,
                "ticket assigned"
            );
            report.assigned += 1;
            wicket_prometheus::record_assignment(&ticket.queue_type.to_string());
            touched.insert(ticket.queue_type);
            self.notify(&ticket, NotificationTemplate::YourTurn).await;
        }

        Ok(touched)
    }

    /// Binds the first advisor from `advisors` that is still Available.
    async fn bind_next(
        &self,
        advisors: &mut impl Iterator<Item = Advisor>,
    ) -> Result<Option<Advisor>, WicketError> {
        for candidate in advisors.by_ref() {
            if let Some(bound) = self.pool.bind(candidate.id).await? {
                return Ok(Some(bound));
            }
        }
        Ok(None)
    }

    async fn release_quietly(&self, advisor: &Advisor, ticket: &Ticket) {
        if let Err(e) = self.pool.release(advisor.id).await {
            error!(ticket = %ticket.number, advisor_id = %advisor.id, error = %e, "failed to release advisor");
        }
    }

    /// Closes an InService ticket as served.
    pub async fn complete_ticket(&self, id: TicketId) -> Result<Ticket, WicketError> {
        self.close(id, TicketStatus::Completed).await
    }

    pub async fn cancel_ticket(&self, id: TicketId) -> Result<Ticket, WicketError> {
        self.close(id, TicketStatus::Cancelled).await
    }

    pub async fn mark_no_show(&self, id: TicketId) -> Result<Ticket, WicketError> {
        self.close(id, TicketStatus::NoShow).await
    }

    async fn close(&self, id: TicketId, outcome: TicketStatus) -> Result<Ticket, WicketError> {
        let mut ticket = self.ticket(id).await?;
        if ticket.status.is_terminal() {
            return Err(WicketError::Conflict(format!(
                "ticket {} is already closed ({})",
                ticket.number, ticket.status
            )));
        }

        let was_serving = ticket.status == TicketStatus::InService;
        ticket.transition_to(outcome)?;
        ticket.updated_at = self.clock.now();
        if !self.tickets.save_ticket(&mut ticket).await? {
            return Err(WicketError::Conflict(format!(
                "ticket {} changed concurrently, retry",
                ticket.number
            )));
        }

        if let (true, Some(advisor_id)) = (was_serving, ticket.advisor_id) {
            if let Err(e) = self.pool.release(advisor_id).await {
                error!(ticket = %ticket.number, %advisor_id, error = %e, "failed to release advisor");
            }
        }

        if let Err(e) = self.dispatcher.cancel(ticket.id).await {
            warn!(ticket = %ticket.number, error = %e, "failed to cancel pending notices");
        }

        info!(ticket = %ticket.number, status = %ticket.status, "ticket closed");
        wicket_prometheus::record_ticket_closed(
            &ticket.queue_type.to_string(),
            &ticket.status.to_string(),
        );
        Ok(ticket)
    }

    pub async fn ticket(&self, id: TicketId) -> Result<Ticket, WicketError> {
        self.tickets
            .find_ticket(id)
            .await?
            .ok_or_else(|| WicketError::not_found("ticket", id))
    }

    pub async fn position_of(&self, number: &str) -> Result<PositionView, WicketError> {
        let ticket = self
            .tickets
            .find_by_number(number)
            .await?
            .ok_or_else(|| WicketError::not_found("ticket", number))?;
        Ok(PositionView::of(&ticket))
    }

    pub async fn find_by_reference(&self, reference: Uuid) -> Result<Ticket, WicketError> {
        self.tickets
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| WicketError::not_found("ticket", reference))
    }

    pub async fn dashboard(&self) -> Result<Dashboard, WicketError> {
        let now = self.clock.now();
        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();

        let counts = TicketCounts {
            created_today: self.tickets.count_created_since(midnight).await?,
            completed: self.tickets.count_by_status(TicketStatus::Completed).await?,
        };
        let mut active = Vec::with_capacity(QueueType::ALL.len());
        for queue in QueueType::ALL {
            active.push((queue, self.tickets.list_active_by_queue(queue).await?));
        }
        let advisors = self.pool.list().await?;

        Ok(Dashboard::assemble(counts, &active, &advisors, now))
    }

    /// Scheduling a notice never fails the ticket operation that asked for it.
    async fn notify(&self, ticket: &Ticket, template: NotificationTemplate) {
        if let Err(e) = self.dispatcher.notify(ticket, template).await {
            warn!(ticket = %ticket.number, %template, error = %e, "failed to schedule notice");
        }
    }
}

#[async_trait]
impl PeriodicTask for QueueCoordinator {
    fn name(&self) -> &str {
        "queue"
    }

    async fn run_once(&self) -> Result<(), WicketError> {
        let started = Instant::now();
        let report = self.tick().await?;
        debug!(
            repositioned = report.repositioned,
            promoted = report.promoted,
            assigned = report.assigned,
            stale = report.stale,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "queue tick"
        );
        Ok(())
    }
}
