// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue coordination for the Wicket queue engine.
//!
//! [`QueueCoordinator`] issues tickets, keeps each queue's positions
//! contiguous and hands queued tickets to advisors through the
//! [`AdvisorPool`].

pub mod coordinator;
pub mod dashboard;
pub mod pool;
pub mod projection;
pub mod validation;

pub use coordinator::{QueueCoordinator, TickReport};
pub use dashboard::{Dashboard, QueueStatus};
pub use pool::AdvisorPool;
pub use projection::PositionView;
pub use validation::CreateTicket;
