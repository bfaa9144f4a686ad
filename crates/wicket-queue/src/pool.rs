// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Advisor selection and load accounting.
//!
//! An advisor's assigned count and status change only through [`AdvisorPool::bind`]
//! and [`AdvisorPool::release`], each a single conditional update in the
//! store. A bind that loses a race against another tick reports `None`
//! instead of overbooking the advisor.

use std::sync::Arc;

use tracing::{debug, info, warn};

use wicket_config::model::AdvisorSeedConfig;
use wicket_core::{Advisor, AdvisorId, AdvisorStatus, AdvisorStore, Clock, NewAdvisor, WicketError};

pub struct AdvisorPool {
    advisors: Arc<dyn AdvisorStore>,
    clock: Arc<dyn Clock>,
    default_capacity: u32,
}

impl AdvisorPool {
    pub fn new(advisors: Arc<dyn AdvisorStore>, clock: Arc<dyn Clock>, default_capacity: u32) -> Self {
        Self {
            advisors,
            clock,
            default_capacity: default_capacity.max(1),
        }
    }

    /// The Available advisor with the fewest assigned tickets, lowest id on ties.
    pub async fn find_least_loaded_available(&self) -> Result<Option<Advisor>, WicketError> {
        self.advisors.find_least_loaded_available().await
    }

    /// Available advisors in selection order.
    pub async fn available_by_load(&self) -> Result<Vec<Advisor>, WicketError> {
        self.advisors.list_available_by_load().await
    }

    /// Takes one unit of the advisor's capacity.
    ///
    /// Returns `None` without changing anything when the advisor is no
    /// longer Available.
    pub async fn bind(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
        let bound = self.advisors.try_bind(id).await?;
        match &bound {
            Some(advisor) => debug!(
                advisor_id = %advisor.id,
                assigned = advisor.assigned_tickets,
                capacity = advisor.capacity,
                status = %advisor.status,
                "advisor bound"
            ),
            None => debug!(advisor_id = %id, "bind rejected, advisor no longer available"),
        }
        Ok(bound)
    }

    /// Returns one unit of capacity, floored at zero.
    pub async fn release(&self, id: AdvisorId) -> Result<Advisor, WicketError> {
        let advisor = self
            .advisors
            .release(id)
            .await?
            .ok_or_else(|| WicketError::not_found("advisor", id))?;
        debug!(
            advisor_id = %advisor.id,
            assigned = advisor.assigned_tickets,
            status = %advisor.status,
            "advisor released"
        );
        Ok(advisor)
    }

    /// Administrative status change: Offline at any load, or back to
    /// Available (re-derived to Busy when the advisor is at capacity).
    pub async fn set_status(
        &self,
        id: AdvisorId,
        status: AdvisorStatus,
    ) -> Result<Advisor, WicketError> {
        if status == AdvisorStatus::Busy {
            return Err(WicketError::invalid(
                "status",
                "must be AVAILABLE or OFFLINE; BUSY follows from load",
            ));
        }
        let advisor = self
            .advisors
            .set_advisor_status(id, status)
            .await?
            .ok_or_else(|| WicketError::not_found("advisor", id))?;
        info!(advisor_id = %advisor.id, module = advisor.module_number, status = %advisor.status, "advisor status changed");
        Ok(advisor)
    }

    pub async fn find(&self, id: AdvisorId) -> Result<Advisor, WicketError> {
        self.advisors
            .find_advisor(id)
            .await?
            .ok_or_else(|| WicketError::not_found("advisor", id))
    }

    pub async fn list(&self) -> Result<Vec<Advisor>, WicketError> {
        self.advisors.list_advisors().await
    }

    /// Registers configured advisors whose module number is not yet taken.
    /// Returns how many were created.
    pub async fn seed(&self, seeds: &[AdvisorSeedConfig]) -> Result<usize, WicketError> {
        let mut created = 0;
        for seed in seeds {
            if let Some(existing) = self.advisors.find_advisor_by_module(seed.module_number).await? {
                if existing.name != seed.name {
                    warn!(
                        module = seed.module_number,
                        existing = %existing.name,
                        configured = %seed.name,
                        "module already registered under another name, keeping stored advisor"
                    );
                }
                continue;
            }
            let advisor = self
                .advisors
                .create_advisor(NewAdvisor {
                    name: seed.name.clone(),
                    email: seed.email.clone(),
                    module_number: seed.module_number,
                    capacity: seed.capacity.unwrap_or(self.default_capacity),
                    created_at: self.clock.now(),
                })
                .await?;
            info!(
                advisor_id = %advisor.id,
                name = %advisor.name,
                module = advisor.module_number,
                capacity = advisor.capacity,
                "advisor registered"
            );
            created += 1;
        }
        Ok(created)
    }
}
