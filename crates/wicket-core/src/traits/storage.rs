// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter lifecycle.

use async_trait::async_trait;

use crate::error::WicketError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of a persistence backend. The entity-level operations live on
/// [`TicketStore`](super::TicketStore), [`AdvisorStore`](super::AdvisorStore)
/// and [`NotificationStore`](super::NotificationStore).
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), WicketError>;

    /// Closes the backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), WicketError>;
}
