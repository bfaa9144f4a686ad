// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket persistence: numbering, lookups, and versioned saves.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use wicket_core::{NewTicket, QueueType, Ticket, TicketId, TicketStatus, WicketError};

use crate::database::Database;
use crate::models::{TICKET_COLUMNS, ticket_from_row, ts};

/// Issues the next number for the ticket's queue and inserts the ticket.
///
/// The counter upsert and the insert share one transaction, so a failed
/// insert does not burn a number.
pub async fn create_ticket(db: &Database, ticket: NewTicket) -> Result<Ticket, WicketError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let queue = ticket.queue_type.to_string();

            let sequence: u32 = tx.query_row(
                "INSERT INTO ticket_counters (queue_type, last_sequence) VALUES (?1, 1)
                 ON CONFLICT (queue_type) DO UPDATE SET last_sequence = last_sequence + 1
                 RETURNING last_sequence",
                params![queue],
                |row| row.get(0),
            )?;
            let number = ticket.queue_type.format_number(sequence);

            tx.execute(
                "INSERT INTO tickets (reference, number, national_id, phone, branch_office,
                     queue_type, status, position, estimated_wait_minutes,
                     created_at, updated_at, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, 0)",
                params![
                    ticket.reference.to_string(),
                    number,
                    ticket.national_id,
                    ticket.phone,
                    ticket.branch_office,
                    queue,
                    TicketStatus::Waiting.to_string(),
                    ticket.position,
                    ticket.estimated_wait_minutes,
                    ts(ticket.created_at),
                ],
            )?;
            let id = TicketId(tx.last_insert_rowid());
            tx.commit()?;

            Ok(ticket.into_ticket(id, number))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_ticket(db: &Database, id: TicketId) -> Result<Option<Ticket>, WicketError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
                params![id.0],
                ticket_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_by_number(db: &Database, number: &str) -> Result<Option<Ticket>, WicketError> {
    let number = number.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE number = ?1"),
                params![number],
                ticket_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_by_reference(
    db: &Database,
    reference: Uuid,
) -> Result<Option<Ticket>, WicketError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE reference = ?1"),
                params![reference.to_string()],
                ticket_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active tickets of one queue, oldest first.
pub async fn list_active_by_queue(
    db: &Database,
    queue: QueueType,
) -> Result<Vec<Ticket>, WicketError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE queue_type = ?1 AND status IN ('WAITING', 'NEXT', 'IN_SERVICE')
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![queue.to_string()], ticket_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Versioned update of the mutable ticket fields.
///
/// Returns `false` without writing when the stored version differs from
/// `ticket.version`. On success `ticket.version` is bumped to match the row.
pub async fn save_ticket(db: &Database, ticket: &mut Ticket) -> Result<bool, WicketError> {
    let snapshot = ticket.clone();
    let saved = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE tickets SET status = ?1, position = ?2, estimated_wait_minutes = ?3,
                     advisor_id = ?4, module_number = ?5, phone = ?6, updated_at = ?7,
                     version = version + 1
                 WHERE id = ?8 AND version = ?9",
                params![
                    snapshot.status.to_string(),
                    snapshot.position,
                    snapshot.estimated_wait_minutes,
                    snapshot.advisor_id.map(|a| a.0),
                    snapshot.module_number,
                    snapshot.phone,
                    ts(snapshot.updated_at),
                    snapshot.id.0,
                    snapshot.version,
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if saved {
        ticket.version += 1;
    }
    Ok(saved)
}

pub async fn has_active_ticket(db: &Database, national_id: &str) -> Result<bool, WicketError> {
    let national_id = national_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM tickets
                     WHERE national_id = ?1 AND status IN ('WAITING', 'NEXT', 'IN_SERVICE'))",
                params![national_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn count_created_since(db: &Database, since: DateTime<Utc>) -> Result<u64, WicketError> {
    let count: i64 = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM tickets WHERE created_at >= ?1",
                params![ts(since)],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(count.max(0) as u64)
}

pub async fn count_by_status(db: &Database, status: TicketStatus) -> Result<u64, WicketError> {
    let count: i64 = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM tickets WHERE status = ?1",
                params![status.to_string()],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(count.max(0) as u64)
}
