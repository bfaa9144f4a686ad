// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the domain types in `wicket-core`.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with nanosecond
//! precision, so string comparison in SQL matches chronological order.
//! Enums are stored by their wire names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use wicket_core::{
    Advisor, AdvisorId, Notification, NotificationId, Ticket, TicketId,
};

pub(crate) const TICKET_COLUMNS: &str = "id, reference, number, national_id, phone, branch_office, \
     queue_type, status, position, estimated_wait_minutes, advisor_id, module_number, \
     created_at, updated_at, version";

pub(crate) const ADVISOR_COLUMNS: &str =
    "id, name, email, status, module_number, assigned_tickets, capacity, created_at, updated_at";

pub(crate) const NOTIFICATION_COLUMNS: &str = "id, ticket_id, template, status, scheduled_at, \
     attempts, sent_at, transport_message_id, created_at";

pub(crate) fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, e))
    })
    .transpose()
}

fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = strum::ParseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_err(idx, e))
}

/// Maps a row selected with [`TICKET_COLUMNS`].
pub(crate) fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    let reference: String = row.get(1)?;
    Ok(Ticket {
        id: TicketId(row.get(0)?),
        reference: Uuid::parse_str(&reference).map_err(|e| conversion_err(1, e))?,
        number: row.get(2)?,
        national_id: row.get(3)?,
        phone: row.get(4)?,
        branch_office: row.get(5)?,
        queue_type: get_enum(row, 6)?,
        status: get_enum(row, 7)?,
        position: row.get(8)?,
        estimated_wait_minutes: row.get(9)?,
        advisor_id: row.get::<_, Option<i64>>(10)?.map(AdvisorId),
        module_number: row.get(11)?,
        created_at: get_ts(row, 12)?,
        updated_at: get_ts(row, 13)?,
        version: row.get(14)?,
    })
}

/// Maps a row selected with [`ADVISOR_COLUMNS`].
pub(crate) fn advisor_from_row(row: &Row<'_>) -> rusqlite::Result<Advisor> {
    Ok(Advisor {
        id: AdvisorId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        status: get_enum(row, 3)?,
        module_number: row.get(4)?,
        assigned_tickets: row.get(5)?,
        capacity: row.get(6)?,
        created_at: get_ts(row, 7)?,
        updated_at: get_ts(row, 8)?,
    })
}

/// Maps a row selected with [`NOTIFICATION_COLUMNS`].
pub(crate) fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: NotificationId(row.get(0)?),
        ticket_id: TicketId(row.get(1)?),
        template: get_enum(row, 2)?,
        status: get_enum(row, 3)?,
        scheduled_at: get_ts(row, 4)?,
        attempts: row.get(5)?,
        sent_at: get_opt_ts(row, 6)?,
        transport_message_id: row.get(7)?,
        created_at: get_ts(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_are_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1);
        assert_eq!(ts(a), "2026-03-01T09:00:00.000000000Z");
        assert_eq!(ts(a).len(), ts(b).len());
        assert!(ts(a) < ts(b));
    }
}
