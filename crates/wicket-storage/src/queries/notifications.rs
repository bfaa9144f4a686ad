// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification persistence.
//!
//! Every state change is guarded by `status = 'PENDING'`, so Sent and
//! Failed rows are never written again.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use wicket_core::{NewNotification, Notification, NotificationId, TicketId, WicketError};

use crate::database::Database;
use crate::models::{NOTIFICATION_COLUMNS, notification_from_row, ts};

/// Inserts a Pending notice. Returns `None` when the ticket already has a
/// Pending or Sent notice with the same template.
pub async fn insert_if_absent(
    db: &Database,
    notification: NewNotification,
) -> Result<Option<Notification>, WicketError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO notifications (ticket_id, template, status, scheduled_at,
                     attempts, created_at)
                 VALUES (?1, ?2, 'PENDING', ?3, 0, ?4)
                 ON CONFLICT (ticket_id, template) WHERE status IN ('PENDING', 'SENT')
                 DO NOTHING",
                params![
                    notification.ticket_id.0,
                    notification.template.to_string(),
                    ts(notification.scheduled_at),
                    ts(notification.created_at),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let id = NotificationId(conn.last_insert_rowid());
            Ok(Some(notification.into_notification(id)))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_notification(
    db: &Database,
    id: NotificationId,
) -> Result<Option<Notification>, WicketError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
                params![id.0],
                notification_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn list_for_ticket(
    db: &Database,
    ticket_id: TicketId,
) -> Result<Vec<Notification>, WicketError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE ticket_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![ticket_id.0], notification_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Never-attempted Pending notices due at `now`, oldest schedule first.
pub async fn list_pending_due(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<Notification>, WicketError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE status = 'PENDING' AND attempts = 0 AND scheduled_at <= ?1
                 ORDER BY scheduled_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![ts(now)], notification_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Pending notices with at least one failed attempt, below the cap, due at `now`.
pub async fn list_retry_due(
    db: &Database,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<Vec<Notification>, WicketError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE status = 'PENDING' AND attempts > 0 AND attempts < ?2
                   AND scheduled_at <= ?1
                 ORDER BY scheduled_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![ts(now), max_attempts], notification_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn mark_sent(
    db: &Database,
    id: NotificationId,
    sent_at: DateTime<Utc>,
    transport_message_id: &str,
) -> Result<bool, WicketError> {
    let message_id = transport_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notifications SET status = 'SENT', sent_at = ?2, transport_message_id = ?3
                 WHERE id = ?1 AND status = 'PENDING'",
                params![id.0, ts(sent_at), message_id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Counts one failure; at `max_attempts` the notice becomes Failed for good.
pub async fn record_failed_attempt(
    db: &Database,
    id: NotificationId,
    retry_at: DateTime<Utc>,
    max_attempts: u32,
) -> Result<Option<Notification>, WicketError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE notifications SET
                         attempts = MIN(attempts + 1, ?3),
                         status = CASE WHEN attempts + 1 >= ?3 THEN 'FAILED' ELSE 'PENDING' END,
                         scheduled_at = CASE WHEN attempts + 1 >= ?3 THEN scheduled_at ELSE ?2 END
                     WHERE id = ?1 AND status = 'PENDING'
                     RETURNING {NOTIFICATION_COLUMNS}"
                ),
                params![id.0, ts(retry_at), max_attempts],
                notification_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn cancel_pending_for_ticket(
    db: &Database,
    ticket_id: TicketId,
) -> Result<u64, WicketError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notifications SET status = 'FAILED'
                 WHERE ticket_id = ?1 AND status = 'PENDING'",
                params![ticket_id.0],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(changed as u64)
}

/// Fails Pending rows left at or above a cap that has since been lowered.
pub async fn fail_exhausted(db: &Database, max_attempts: u32) -> Result<u64, WicketError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE notifications SET status = 'FAILED'
                 WHERE status = 'PENDING' AND attempts >= ?1",
                params![max_attempts],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(changed as u64)
}
