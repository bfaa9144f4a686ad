// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket request validation.
//!
//! Every field is checked and all problems are reported together, before
//! anything is written.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use wicket_core::{FieldError, QueueType, TicketRequest, WicketError};

const NATIONAL_ID_MIN: usize = 7;
const NATIONAL_ID_MAX: usize = 20;
const BRANCH_OFFICE_MAX: usize = 100;

/// Optional leading `+`, then up to 15 digits not starting with 0.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone pattern is valid"));

/// Raw ticket request as received from a client.
///
/// Fields are loosely typed on purpose so that a missing field or an
/// unknown queue type becomes a field error instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTicket {
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub branch_office: Option<String>,
    pub queue_type: Option<String>,
}

impl CreateTicket {
    pub fn validate(self) -> Result<TicketRequest, WicketError> {
        let mut errors = Vec::new();

        let national_id = self.national_id.unwrap_or_default().trim().to_string();
        let len = national_id.chars().count();
        if national_id.is_empty() {
            errors.push(FieldError::new("nationalId", "is required"));
        } else if !(NATIONAL_ID_MIN..=NATIONAL_ID_MAX).contains(&len) {
            errors.push(FieldError::new(
                "nationalId",
                format!("must be between {NATIONAL_ID_MIN} and {NATIONAL_ID_MAX} characters"),
            ));
        }

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if let Some(p) = &phone
            && !PHONE_RE.is_match(p)
        {
            errors.push(FieldError::new("phone", "invalid phone number format"));
        }

        let branch_office = self.branch_office.unwrap_or_default().trim().to_string();
        if branch_office.is_empty() {
            errors.push(FieldError::new("branchOffice", "is required"));
        } else if branch_office.chars().count() > BRANCH_OFFICE_MAX {
            errors.push(FieldError::new(
                "branchOffice",
                format!("must be at most {BRANCH_OFFICE_MAX} characters"),
            ));
        }

        let queue_type = match self.queue_type.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new("queueType", "is required"));
                None
            }
            Some(raw) => match raw.parse::<QueueType>() {
                Ok(q) => Some(q),
                Err(_) => {
                    errors.push(FieldError::new(
                        "queueType",
                        format!("unknown queue type `{raw}`"),
                    ));
                    None
                }
            },
        };

        match queue_type {
            Some(queue_type) if errors.is_empty() => Ok(TicketRequest {
                national_id,
                phone,
                branch_office,
                queue_type,
            }),
            _ => Err(WicketError::Validation { errors }),
        }
    }
}
