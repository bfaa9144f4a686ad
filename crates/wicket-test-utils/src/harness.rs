// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end queue scenarios.
//!
//! `TestHarness` assembles the full engine (stores, advisor pool,
//! notification dispatcher and queue coordinator) around a manual clock and
//! a scriptable mock transport. The store is in-memory by default, or a
//! temporary SQLite database with [`TestHarnessBuilder::with_sqlite`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use wicket_config::model::{AdvisorSeedConfig, StorageConfig, WicketConfig};
use wicket_core::{
    Advisor, AdvisorStore, Notification, NotificationStore, StorageAdapter, Ticket, TicketStore,
    WicketError,
};
use wicket_notify::{DeliveryReport, NotificationDispatcher};
use wicket_queue::{AdvisorPool, CreateTicket, QueueCoordinator, TickReport};
use wicket_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::memory_store::MemoryStore;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: WicketConfig,
    sqlite: bool,
    transport: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: WicketConfig::default(),
            sqlite: false,
            transport: true,
        }
    }

    /// Registers an advisor at `module` with the given capacity.
    pub fn with_advisor(mut self, module: u32, capacity: u32) -> Self {
        self.config.advisors.push(AdvisorSeedConfig {
            name: format!("Advisor {module}"),
            email: format!("advisor{module}@branch.test"),
            module_number: module,
            capacity: Some(capacity),
        });
        self
    }

    /// Adjusts the configuration before the engine is built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut WicketConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Uses a temporary SQLite database instead of the in-memory store.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Builds the dispatcher without a transport.
    pub fn without_transport(mut self) -> Self {
        self.transport = false;
        self
    }

    pub async fn build(self) -> Result<TestHarness, WicketError> {
        let clock = Arc::new(ManualClock::morning());
        let transport = Arc::new(MockTransport::new());

        let (tickets, advisors, notifications, memory, temp_dir): (
            Arc<dyn TicketStore>,
            Arc<dyn AdvisorStore>,
            Arc<dyn NotificationStore>,
            Option<Arc<MemoryStore>>,
            Option<tempfile::TempDir>,
        ) = if self.sqlite {
            let temp_dir =
                tempfile::TempDir::new().map_err(|e| WicketError::Storage { source: e.into() })?;
            let storage = SqliteStorage::new(StorageConfig {
                database_path: temp_dir.path().join("wicket.db").to_string_lossy().into_owned(),
                wal_mode: true,
            });
            storage.initialize().await?;
            let storage = Arc::new(storage);
            (
                storage.clone(),
                storage.clone(),
                storage,
                None,
                Some(temp_dir),
            )
        } else {
            let store = Arc::new(MemoryStore::new());
            (
                store.clone(),
                store.clone(),
                store.clone(),
                Some(store),
                None,
            )
        };

        let pool = Arc::new(AdvisorPool::new(
            advisors,
            clock.clone(),
            self.config.queue.default_advisor_capacity,
        ));
        pool.seed(&self.config.advisors).await?;

        let mut dispatcher = NotificationDispatcher::new(
            self.config.notification.clone(),
            tickets.clone(),
            notifications.clone(),
            clock.clone(),
        );
        if self.transport {
            dispatcher = dispatcher.with_transport(transport.clone());
        }
        let dispatcher = Arc::new(dispatcher);

        let coordinator = Arc::new(QueueCoordinator::new(
            tickets.clone(),
            pool.clone(),
            dispatcher.clone(),
            clock.clone(),
            self.config.queue.clone(),
        ));

        Ok(TestHarness {
            config: self.config,
            tickets,
            notifications,
            memory,
            clock,
            transport,
            pool,
            dispatcher,
            coordinator,
            clients: AtomicU32::new(0),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete queue engine wired to test doubles.
pub struct TestHarness {
    pub config: WicketConfig,
    pub tickets: Arc<dyn TicketStore>,
    pub notifications: Arc<dyn NotificationStore>,
    /// Set when the harness runs on the in-memory store.
    pub memory: Option<Arc<MemoryStore>>,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<MockTransport>,
    pub pool: Arc<AdvisorPool>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub coordinator: Arc<QueueCoordinator>,
    clients: AtomicU32,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A valid request for `queue` from a fresh client with a phone.
    pub fn request(&self, queue: &str) -> CreateTicket {
        let client = self.clients.fetch_add(1, Ordering::Relaxed) + 1;
        CreateTicket {
            national_id: Some(format!("{:08}", 10_000_000 + client)),
            phone: Some(format!("+5691{client:07}")),
            branch_office: Some("Centro".to_string()),
            queue_type: Some(queue.to_string()),
        }
    }

    pub async fn create(&self, queue: &str) -> Result<Ticket, WicketError> {
        self.coordinator.create_ticket(self.request(queue)).await
    }

    /// Creates a ticket without a phone, so no notice is ever scheduled.
    pub async fn create_silent(&self, queue: &str) -> Result<Ticket, WicketError> {
        let mut request = self.request(queue);
        request.phone = None;
        self.coordinator.create_ticket(request).await
    }

    pub async fn tick(&self) -> Result<TickReport, WicketError> {
        self.coordinator.tick().await
    }

    pub async fn deliver(&self) -> Result<DeliveryReport, WicketError> {
        self.dispatcher.delivery_tick().await
    }

    /// Reloads a ticket from the store.
    pub async fn reload(&self, ticket: &Ticket) -> Result<Ticket, WicketError> {
        self.coordinator.ticket(ticket.id).await
    }

    pub async fn advisor(&self, module: u32) -> Result<Advisor, WicketError> {
        self.pool
            .list()
            .await?
            .into_iter()
            .find(|a| a.module_number == module)
            .ok_or_else(|| WicketError::not_found("advisor", format!("module {module}")))
    }

    pub async fn notices(&self, ticket: &Ticket) -> Result<Vec<Notification>, WicketError> {
        self.notifications.list_for_ticket(ticket.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder()
            .with_advisor(1, 1)
            .build()
            .await
            .unwrap();
        assert!(harness.memory.is_some());
        assert_eq!(harness.pool.list().await.unwrap().len(), 1);
        assert_eq!(harness.advisor(1).await.unwrap().capacity, 1);
    }

    #[tokio::test]
    async fn requests_come_from_distinct_clients() {
        let harness = TestHarness::builder().build().await.unwrap();
        let a = harness.request("CAJA");
        let b = harness.request("CAJA");
        assert_ne!(a.national_id, b.national_id);
        assert_ne!(a.phone, b.phone);
    }

    #[tokio::test]
    async fn sqlite_harness_uses_its_own_database() {
        let h1 = TestHarness::builder().with_sqlite().build().await.unwrap();
        let h2 = TestHarness::builder().with_sqlite().build().await.unwrap();
        assert!(h1.memory.is_none());

        let ticket = h1.create("CAJA").await.unwrap();
        assert_eq!(ticket.number, "C01");
        let other = h2.create("CAJA").await.unwrap();
        assert_eq!(other.number, "C01");
    }
}
