// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification scheduling and the at-least-once delivery loop.
//!
//! The [`NotificationDispatcher`] owns three operations:
//! - **schedule**: creates a Pending notice unless the ticket already has a
//!   Pending or Sent notice with the same template (the store enforces this
//!   atomically). Tickets without a phone are skipped.
//! - **delivery tick**: sends every due notice through the transport under a
//!   timeout. A failure counts one attempt and pushes the notice back by the
//!   retry backoff; reaching the attempt cap marks it Failed for good.
//! - **cancel**: marks a ticket's Pending notices Failed without sending.
//!
//! Transport errors never escape the delivery tick and never touch the
//! ticket's own lifecycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use wicket_config::model::NotificationConfig;
use wicket_core::{
    Clock, MessageId, NewNotification, Notification, NotificationStatus, NotificationStore,
    NotificationTemplate, NotificationTransport, PeriodicTask, Ticket, TicketId, TicketStore,
    WicketError,
};

use crate::template;

/// What one delivery tick did, by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: u64,
    /// Failed attempts that left the notice Pending for a later retry.
    pub retried: u64,
    /// Failed attempts that hit the cap, plus notices already past a
    /// lowered cap.
    pub failed: u64,
    /// Notices dropped because their ticket had already closed.
    pub cancelled: u64,
    /// Notices skipped because of a storage error; retried next tick.
    pub errors: u64,
}

impl DeliveryReport {
    pub fn attempted(&self) -> u64 {
        self.sent + self.retried + self.failed
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Sent => self.sent += 1,
            Outcome::Retried => self.retried += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Cancelled => self.cancelled += 1,
            Outcome::Skipped => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sent,
    Retried,
    Failed,
    Cancelled,
    /// The notice changed under us (cancelled or already handled).
    Skipped,
}

pub struct NotificationDispatcher {
    config: NotificationConfig,
    tickets: Arc<dyn TicketStore>,
    notifications: Arc<dyn NotificationStore>,
    transport: Option<Arc<dyn NotificationTransport>>,
    clock: Arc<dyn Clock>,
}

impl NotificationDispatcher {
    /// A dispatcher with no transport schedules and cancels normally but
    /// delivers nothing; notices wait until one is attached.
    pub fn new(
        config: NotificationConfig,
        tickets: Arc<dyn TicketStore>,
        notifications: Arc<dyn NotificationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            tickets,
            notifications,
            transport: None,
            clock,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn NotificationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    /// Configured delay between the triggering event and delivery.
    pub fn delay_for(&self, template: NotificationTemplate) -> Duration {
        let secs = match template {
            NotificationTemplate::TicketCreated => self.config.ticket_created_delay_secs,
            NotificationTemplate::NextTurn => self.config.next_turn_delay_secs,
            NotificationTemplate::YourTurn => self.config.your_turn_delay_secs,
        };
        Duration::from_secs(secs)
    }

    /// Schedules `template` for `ticket` after its configured delay.
    pub async fn notify(
        &self,
        ticket: &Ticket,
        template: NotificationTemplate,
    ) -> Result<Option<Notification>, WicketError> {
        self.schedule(ticket, template, self.delay_for(template))
            .await
    }

    /// Creates a Pending notice due at `now + delay`.
    ///
    /// Returns `None` when the ticket has no phone or already holds a
    /// Pending or Sent notice for this template.
    pub async fn schedule(
        &self,
        ticket: &Ticket,
        template: NotificationTemplate,
        delay: Duration,
    ) -> Result<Option<Notification>, WicketError> {
        if ticket.recipient().is_none() {
            debug!(ticket = %ticket.number, %template, "no phone on ticket, notice skipped");
            return Ok(None);
        }

        let now = self.clock.now();
        let scheduled_at = after(now, delay);
        let created = self
            .notifications
            .insert_notification_if_absent(NewNotification {
                ticket_id: ticket.id,
                template,
                scheduled_at,
                created_at: now,
            })
            .await?;

        match &created {
            Some(notice) => {
                debug!(
                    ticket = %ticket.number,
                    %template,
                    notification_id = %notice.id,
                    %scheduled_at,
                    "notice scheduled"
                );
                wicket_prometheus::record_notifications("scheduled", 1);
            }
            None => debug!(ticket = %ticket.number, %template, "notice already live, not rescheduled"),
        }
        Ok(created)
    }

    /// Marks every Pending notice of the ticket Failed without delivery.
    pub async fn cancel(&self, ticket_id: TicketId) -> Result<u64, WicketError> {
        let cancelled = self
            .notifications
            .cancel_pending_for_ticket(ticket_id)
            .await?;
        if cancelled > 0 {
            info!(%ticket_id, cancelled, "pending notices cancelled");
            wicket_prometheus::record_notifications("cancelled", cancelled);
        }
        Ok(cancelled)
    }

    /// Delivers every due notice: first-time sends, then retries.
    ///
    /// Pending notices whose attempts already reach `max_attempts` (left
    /// over from a run with a higher cap) are marked Failed first.
    ///
    /// Only storage errors while listing due notices are returned; a
    /// per-notice storage error is logged, counted in
    /// [`DeliveryReport::errors`] and left for the next tick.
    pub async fn delivery_tick(&self) -> Result<DeliveryReport, WicketError> {
        let mut report = DeliveryReport::default();
        let Some(transport) = self.transport.as_ref() else {
            debug!("no transport configured, delivery skipped");
            return Ok(report);
        };

        let exhausted = self
            .notifications
            .fail_exhausted(self.config.max_attempts)
            .await?;
        if exhausted > 0 {
            warn!(
                exhausted,
                max_attempts = self.config.max_attempts,
                "pending notices past the attempt cap marked failed"
            );
            report.failed += exhausted;
        }

        let now = self.clock.now();
        let mut due = self.notifications.list_pending_due(now).await?;
        due.extend(
            self.notifications
                .list_retry_due(now, self.config.max_attempts)
                .await?,
        );

        for notice in due {
            let id = notice.id;
            match self.deliver(transport.as_ref(), notice).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    tracing::error!(notification_id = %id, error = %e, "notice bookkeeping failed");
                    report.errors += 1;
                }
            }
        }

        wicket_prometheus::record_notifications("sent", report.sent);
        wicket_prometheus::record_notifications("retried", report.retried);
        wicket_prometheus::record_notifications("failed", report.failed);
        Ok(report)
    }

    async fn deliver(
        &self,
        transport: &dyn NotificationTransport,
        notice: Notification,
    ) -> Result<Outcome, WicketError> {
        let Some(ticket) = self.tickets.find_ticket(notice.ticket_id).await? else {
            warn!(notification_id = %notice.id, ticket_id = %notice.ticket_id, "notice for unknown ticket");
            return self
                .record_failure(&notice, "ticket not found".to_string())
                .await;
        };

        // Closing a ticket takes precedence over anything still queued for it.
        if ticket.status.is_terminal() {
            self.cancel(ticket.id).await?;
            return Ok(Outcome::Cancelled);
        }

        let Some(recipient) = ticket.recipient() else {
            return self
                .record_failure(&notice, "ticket has no phone".to_string())
                .await;
        };
        let text = template::render(notice.template, &ticket);

        match self.send_bounded(transport, &recipient, &text).await {
            Ok(MessageId(message_id)) => {
                let sent_at = self.clock.now();
                if self
                    .notifications
                    .mark_sent(notice.id, sent_at, &message_id)
                    .await?
                {
                    info!(
                        ticket = %ticket.number,
                        template = %notice.template,
                        attempts = notice.attempts,
                        message_id = %message_id,
                        "notice sent"
                    );
                    Ok(Outcome::Sent)
                } else {
                    debug!(notification_id = %notice.id, "notice closed while sending");
                    Ok(Outcome::Skipped)
                }
            }
            Err(e) => self.record_failure(&notice, e.to_string()).await,
        }
    }

    async fn send_bounded(
        &self,
        transport: &dyn NotificationTransport,
        recipient: &str,
        text: &str,
    ) -> Result<MessageId, WicketError> {
        let timeout = self.config.transport_timeout();
        match tokio::time::timeout(timeout, transport.send(recipient, text)).await {
            Ok(result) => result,
            Err(_) => Err(WicketError::Timeout { duration: timeout }),
        }
    }

    async fn record_failure(
        &self,
        notice: &Notification,
        reason: String,
    ) -> Result<Outcome, WicketError> {
        let retry_at = self.retry_at(self.clock.now());
        let Some(updated) = self
            .notifications
            .record_failed_attempt(notice.id, retry_at, self.config.max_attempts)
            .await?
        else {
            return Ok(Outcome::Skipped);
        };

        if updated.status == NotificationStatus::Failed {
            warn!(
                notification_id = %updated.id,
                ticket_id = %updated.ticket_id,
                template = %updated.template,
                attempts = updated.attempts,
                %reason,
                "notice failed permanently"
            );
            Ok(Outcome::Failed)
        } else {
            warn!(
                notification_id = %updated.id,
                ticket_id = %updated.ticket_id,
                template = %updated.template,
                attempts = updated.attempts,
                %retry_at,
                %reason,
                "notice delivery failed, will retry"
            );
            Ok(Outcome::Retried)
        }
    }

    fn retry_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        after(now, self.config.retry_backoff())
    }
}

/// `now + delay`, saturating instead of overflowing.
fn after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl PeriodicTask for NotificationDispatcher {
    fn name(&self) -> &str {
        "delivery"
    }

    async fn run_once(&self) -> Result<(), WicketError> {
        let started = Instant::now();
        let report = self.delivery_tick().await?;
        if report.attempted() > 0 || report.cancelled > 0 || report.errors > 0 {
            info!(
                sent = report.sent,
                retried = report.retried,
                failed = report.failed,
                cancelled = report.cancelled,
                errors = report.errors,
                "delivery tick"
            );
        }
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "delivery tick finished");
        Ok(())
    }
}
