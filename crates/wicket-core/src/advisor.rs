// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Advisor entity: a staffed service point with a concurrent-ticket capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::AdvisorId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AdvisorStatus {
    Available,
    Busy,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    pub id: AdvisorId,
    pub name: String,
    pub email: String,
    pub status: AdvisorStatus,
    pub module_number: u32,
    pub assigned_tickets: u32,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Advisor {
    pub fn is_full(&self) -> bool {
        self.assigned_tickets >= self.capacity
    }

    /// Status implied by the current load, for an advisor that is not Offline.
    pub fn load_status(assigned_tickets: u32, capacity: u32) -> AdvisorStatus {
        if assigned_tickets >= capacity {
            AdvisorStatus::Busy
        } else {
            AdvisorStatus::Available
        }
    }
}

/// An advisor about to be registered. Starts Available with no load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdvisor {
    pub name: String,
    pub email: String,
    pub module_number: u32,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
}

impl NewAdvisor {
    pub fn into_advisor(self, id: AdvisorId) -> Advisor {
        Advisor {
            id,
            name: self.name,
            email: self.email,
            status: AdvisorStatus::Available,
            module_number: self.module_number,
            assigned_tickets: 0,
            capacity: self.capacity,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
