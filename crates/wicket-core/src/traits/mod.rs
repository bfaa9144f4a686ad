// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the queue engine and its collaborators.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod storage;
pub mod store;
pub mod task;
pub mod transport;

pub use adapter::PluginAdapter;
pub use storage::StorageAdapter;
pub use store::{AdvisorStore, NotificationStore, TicketStore};
pub use task::PeriodicTask;
pub use transport::NotificationTransport;
