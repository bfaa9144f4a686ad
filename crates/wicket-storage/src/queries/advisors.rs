// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Advisor persistence. Load changes are single conditional UPDATEs.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use wicket_core::{Advisor, AdvisorId, AdvisorStatus, NewAdvisor, WicketError};

use crate::database::Database;
use crate::models::{ADVISOR_COLUMNS, advisor_from_row, ts};

/// Inserts a new advisor. A taken module number is a conflict.
pub async fn create_advisor(db: &Database, advisor: NewAdvisor) -> Result<Advisor, WicketError> {
    let module_number = advisor.module_number;
    let inserted = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO advisors (name, email, status, module_number, assigned_tickets,
                     capacity, created_at, updated_at)
                 VALUES (?1, ?2, 'AVAILABLE', ?3, 0, ?4, ?5, ?5)
                 ON CONFLICT (module_number) DO NOTHING",
                params![
                    advisor.name,
                    advisor.email,
                    advisor.module_number,
                    advisor.capacity,
                    ts(advisor.created_at),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Ok(Some(advisor.into_advisor(AdvisorId(conn.last_insert_rowid()))))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    inserted.ok_or_else(|| {
        WicketError::Conflict(format!("module {module_number} already has an advisor"))
    })
}

pub async fn find_advisor(db: &Database, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ADVISOR_COLUMNS} FROM advisors WHERE id = ?1"),
                params![id.0],
                advisor_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_advisor_by_module(
    db: &Database,
    module_number: u32,
) -> Result<Option<Advisor>, WicketError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ADVISOR_COLUMNS} FROM advisors WHERE module_number = ?1"),
                params![module_number],
                advisor_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn list_advisors(db: &Database) -> Result<Vec<Advisor>, WicketError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ADVISOR_COLUMNS} FROM advisors ORDER BY id"))?;
            let rows = stmt.query_map([], advisor_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn list_advisors_by_status(
    db: &Database,
    status: AdvisorStatus,
) -> Result<Vec<Advisor>, WicketError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ADVISOR_COLUMNS} FROM advisors WHERE status = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![status.to_string()], advisor_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Available advisors, least loaded first, ties broken by id.
pub async fn list_available_by_load(db: &Database) -> Result<Vec<Advisor>, WicketError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ADVISOR_COLUMNS} FROM advisors
                 WHERE status = 'AVAILABLE' AND assigned_tickets < capacity
                 ORDER BY assigned_tickets ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], advisor_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Takes one unit of the advisor's capacity if it is still Available.
pub async fn try_bind(db: &Database, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
    let now = ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE advisors SET
                         assigned_tickets = assigned_tickets + 1,
                         status = CASE WHEN assigned_tickets + 1 >= capacity
                                       THEN 'BUSY' ELSE status END,
                         updated_at = ?2
                     WHERE id = ?1 AND status = 'AVAILABLE' AND assigned_tickets < capacity
                     RETURNING {ADVISOR_COLUMNS}"
                ),
                params![id.0, now],
                advisor_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Returns one unit of capacity. Offline advisors stay Offline.
pub async fn release(db: &Database, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
    let now = ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE advisors SET
                         assigned_tickets = MAX(assigned_tickets - 1, 0),
                         status = CASE WHEN status = 'BUSY' AND MAX(assigned_tickets - 1, 0) < capacity
                                       THEN 'AVAILABLE' ELSE status END,
                         updated_at = ?2
                     WHERE id = ?1
                     RETURNING {ADVISOR_COLUMNS}"
                ),
                params![id.0, now],
                advisor_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Administrative status change. Anything other than Offline is derived
/// from the current load so a full advisor can never be marked Available.
pub async fn set_advisor_status(
    db: &Database,
    id: AdvisorId,
    status: AdvisorStatus,
) -> Result<Option<Advisor>, WicketError> {
    let now = ts(Utc::now());
    let offline = status == AdvisorStatus::Offline;
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE advisors SET
                         status = CASE
                             WHEN ?2 THEN 'OFFLINE'
                             WHEN assigned_tickets >= capacity THEN 'BUSY'
                             ELSE 'AVAILABLE' END,
                         updated_at = ?3
                     WHERE id = ?1
                     RETURNING {ADVISOR_COLUMNS}"
                ),
                params![id.0, offline, now],
                advisor_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
