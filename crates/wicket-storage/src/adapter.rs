// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

use wicket_config::model::StorageConfig;
use wicket_core::{
    AdapterType, Advisor, AdvisorId, AdvisorStatus, AdvisorStore, HealthStatus, NewAdvisor,
    NewNotification, NewTicket, Notification, NotificationId, NotificationStore, PluginAdapter,
    QueueType, StorageAdapter, Ticket, TicketId, TicketStatus, TicketStore, WicketError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage for tickets, advisors, and notifications.
///
/// The database is opened on the first call to
/// [`StorageAdapter::initialize`]; every other call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, WicketError> {
        self.db.get().ok_or_else(|| WicketError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WicketError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WicketError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("sqlite storage shut down");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WicketError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WicketError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "sqlite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WicketError> {
        self.db()?.close().await
    }
}

#[async_trait]
impl TicketStore for SqliteStorage {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, WicketError> {
        queries::tickets::create_ticket(self.db()?, ticket).await
    }

    async fn find_ticket(&self, id: TicketId) -> Result<Option<Ticket>, WicketError> {
        queries::tickets::find_ticket(self.db()?, id).await
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Ticket>, WicketError> {
        queries::tickets::find_by_number(self.db()?, number).await
    }

    async fn find_by_reference(&self, reference: Uuid) -> Result<Option<Ticket>, WicketError> {
        queries::tickets::find_by_reference(self.db()?, reference).await
    }

    async fn list_active_by_queue(&self, queue: QueueType) -> Result<Vec<Ticket>, WicketError> {
        queries::tickets::list_active_by_queue(self.db()?, queue).await
    }

    async fn save_ticket(&self, ticket: &mut Ticket) -> Result<bool, WicketError> {
        queries::tickets::save_ticket(self.db()?, ticket).await
    }

    async fn has_active_ticket(&self, national_id: &str) -> Result<bool, WicketError> {
        queries::tickets::has_active_ticket(self.db()?, national_id).await
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, WicketError> {
        queries::tickets::count_created_since(self.db()?, since).await
    }

    async fn count_by_status(&self, status: TicketStatus) -> Result<u64, WicketError> {
        queries::tickets::count_by_status(self.db()?, status).await
    }
}

#[async_trait]
impl AdvisorStore for SqliteStorage {
    async fn create_advisor(&self, advisor: NewAdvisor) -> Result<Advisor, WicketError> {
        queries::advisors::create_advisor(self.db()?, advisor).await
    }

    async fn find_advisor(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
        queries::advisors::find_advisor(self.db()?, id).await
    }

    async fn find_advisor_by_module(
        &self,
        module_number: u32,
    ) -> Result<Option<Advisor>, WicketError> {
        queries::advisors::find_advisor_by_module(self.db()?, module_number).await
    }

    async fn list_advisors(&self) -> Result<Vec<Advisor>, WicketError> {
        queries::advisors::list_advisors(self.db()?).await
    }

    async fn list_advisors_by_status(
        &self,
        status: AdvisorStatus,
    ) -> Result<Vec<Advisor>, WicketError> {
        queries::advisors::list_advisors_by_status(self.db()?, status).await
    }

    async fn list_available_by_load(&self) -> Result<Vec<Advisor>, WicketError> {
        queries::advisors::list_available_by_load(self.db()?).await
    }

    async fn try_bind(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
        queries::advisors::try_bind(self.db()?, id).await
    }

    async fn release(&self, id: AdvisorId) -> Result<Option<Advisor>, WicketError> {
        queries::advisors::release(self.db()?, id).await
    }

    async fn set_advisor_status(
        &self,
        id: AdvisorId,
        status: AdvisorStatus,
    ) -> Result<Option<Advisor>, WicketError> {
        queries::advisors::set_advisor_status(self.db()?, id, status).await
    }
}

#[async_trait]
impl NotificationStore for SqliteStorage {
    async fn insert_notification_if_absent(
        &self,
        notification: NewNotification,
    ) -> Result<Option<Notification>, WicketError> {
        queries::notifications::insert_if_absent(self.db()?, notification).await
    }

    async fn find_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, WicketError> {
        queries::notifications::find_notification(self.db()?, id).await
    }

    async fn list_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Notification>, WicketError> {
        queries::notifications::list_for_ticket(self.db()?, ticket_id).await
    }

    async fn list_pending_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, WicketError> {
        queries::notifications::list_pending_due(self.db()?, now).await
    }

    async fn list_retry_due(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<Notification>, WicketError> {
        queries::notifications::list_retry_due(self.db()?, now, max_attempts).await
    }

    async fn mark_sent(
        &self,
        id: NotificationId,
        sent_at: DateTime<Utc>,
        transport_message_id: &str,
    ) -> Result<bool, WicketError> {
        queries::notifications::mark_sent(self.db()?, id, sent_at, transport_message_id).await
    }

    async fn record_failed_attempt(
        &self,
        id: NotificationId,
        retry_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Option<Notification>, WicketError> {
        queries::notifications::record_failed_attempt(self.db()?, id, retry_at, max_attempts).await
    }

    async fn cancel_pending_for_ticket(&self, ticket_id: TicketId) -> Result<u64, WicketError> {
        queries::notifications::cancel_pending_for_ticket(self.db()?, ticket_id).await
    }

    async fn fail_exhausted(&self, max_attempts: u32) -> Result<u64, WicketError> {
        queries::notifications::fail_exhausted(self.db()?, max_attempts).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use tempfile::{TempDir, tempdir};
    use wicket_core::{NotificationStatus, NotificationTemplate, TicketRequest};

    use super::*;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    async fn open() -> (TempDir, SqliteStorage) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("wicket.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        (dir, storage)
    }

    fn request(queue: QueueType, phone: Option<&str>) -> TicketRequest {
        TicketRequest {
            national_id: "12345678-9".into(),
            phone: phone.map(str::to_string),
            branch_office: "Centro".into(),
            queue_type: queue,
        }
    }

    fn advisor(module_number: u32, capacity: u32) -> NewAdvisor {
        NewAdvisor {
            name: format!("advisor {module_number}"),
            email: String::new(),
            module_number,
            capacity,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let (_dir, storage) = open().await;
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        assert!(storage.health_check().await.is_err());

        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn ticket_numbers_are_per_queue_and_sequential() {
        let (_dir, storage) = open().await;
        let now = Utc::now();

        let c1 = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, None), 1, now))
            .await
            .unwrap();
        let p1 = storage
            .create_ticket(NewTicket::new(request(QueueType::PersonalBanker, None), 1, now))
            .await
            .unwrap();
        let c2 = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, None), 2, now))
            .await
            .unwrap();

        assert_eq!(c1.number, "C01");
        assert_eq!(p1.number, "P01");
        assert_eq!(c2.number, "C02");
        assert_eq!(c2.status, TicketStatus::Waiting);

        let found = storage.find_by_reference(c2.reference).await.unwrap().unwrap();
        assert_eq!(found, c2);
        assert_eq!(storage.find_by_number("P01").await.unwrap().unwrap().id, p1.id);
        assert!(storage.find_by_number("G01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_creation_issues_unique_increasing_numbers() {
        let (_dir, storage) = open().await;
        let storage = Arc::new(storage);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let storage = Arc::clone(&storage);
            handles.push(tokio::spawn(async move {
                storage
                    .create_ticket(NewTicket::new(request(QueueType::Caja, None), 1, Utc::now()))
                    .await
                    .unwrap()
            }));
        }
        let mut ids_and_numbers = Vec::new();
        for handle in handles {
            let ticket = handle.await.unwrap();
            ids_and_numbers.push((ticket.id, ticket.number));
        }
        ids_and_numbers.sort();

        let numbers: Vec<String> = ids_and_numbers.into_iter().map(|(_, n)| n).collect();
        let expected: Vec<String> = (1..=10).map(|n| format!("C{n:02}")).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test]
    async fn stale_ticket_save_is_rejected() {
        let (_dir, storage) = open().await;
        let created = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, None), 1, Utc::now()))
            .await
            .unwrap();

        let mut first = created.clone();
        let mut second = created;

        first.transition_to(TicketStatus::Next).unwrap();
        assert!(storage.save_ticket(&mut first).await.unwrap());
        assert_eq!(first.version, 1);

        second.transition_to(TicketStatus::Cancelled).unwrap();
        assert!(!storage.save_ticket(&mut second).await.unwrap());
        assert_eq!(second.version, 0);

        let stored = storage.find_ticket(first.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Next);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn active_listing_excludes_terminal_tickets() {
        let (_dir, storage) = open().await;
        let now = Utc::now();
        let mut first = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, None), 1, now))
            .await
            .unwrap();
        let second = storage
            .create_ticket(NewTicket::new(
                request(QueueType::Caja, None),
                2,
                now + Duration::seconds(1),
            ))
            .await
            .unwrap();

        first.transition_to(TicketStatus::Cancelled).unwrap();
        assert!(storage.save_ticket(&mut first).await.unwrap());

        let active = storage.list_active_by_queue(QueueType::Caja).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert!(storage.has_active_ticket("12345678-9").await.unwrap());
        assert_eq!(
            storage.count_by_status(TicketStatus::Cancelled).await.unwrap(),
            1
        );
        assert_eq!(
            storage
                .count_created_since(now - Duration::hours(1))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn active_listing_follows_issue_order_not_timestamps() {
        let (_dir, storage) = open().await;
        let now = Utc::now();
        let first = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, None), 1, now))
            .await
            .unwrap();
        // Stamped earlier but issued later, as a slower concurrent request would be.
        let second = storage
            .create_ticket(NewTicket::new(
                request(QueueType::Caja, None),
                1,
                now - Duration::seconds(2),
            ))
            .await
            .unwrap();
        assert_eq!(second.number, "C02");

        let active = storage.list_active_by_queue(QueueType::Caja).await.unwrap();
        let order: Vec<_> = active.iter().map(|t| t.number.as_str()).collect();
        assert_eq!(order, vec!["C01", "C02"]);
        assert_eq!(active[0].id, first.id);
    }

    #[tokio::test]
    async fn bind_flips_busy_at_capacity_and_release_restores() {
        let (_dir, storage) = open().await;
        let a = storage.create_advisor(advisor(1, 3)).await.unwrap();

        for expected in 1..=3 {
            let bound = storage.try_bind(a.id).await.unwrap().unwrap();
            assert_eq!(bound.assigned_tickets, expected);
        }
        let full = storage.find_advisor(a.id).await.unwrap().unwrap();
        assert_eq!(full.status, AdvisorStatus::Busy);
        assert!(storage.try_bind(a.id).await.unwrap().is_none());

        let released = storage.release(a.id).await.unwrap().unwrap();
        assert_eq!(released.assigned_tickets, 2);
        assert_eq!(released.status, AdvisorStatus::Available);
    }

    #[tokio::test]
    async fn release_is_floored_at_zero() {
        let (_dir, storage) = open().await;
        let a = storage.create_advisor(advisor(2, 1)).await.unwrap();

        let released = storage.release(a.id).await.unwrap().unwrap();
        assert_eq!(released.assigned_tickets, 0);
        assert_eq!(released.status, AdvisorStatus::Available);
        assert!(storage.release(AdvisorId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn least_loaded_breaks_ties_by_id() {
        let (_dir, storage) = open().await;
        let a = storage.create_advisor(advisor(1, 2)).await.unwrap();
        let b = storage.create_advisor(advisor(2, 2)).await.unwrap();

        assert_eq!(
            storage.find_least_loaded_available().await.unwrap().unwrap().id,
            a.id
        );
        storage.try_bind(a.id).await.unwrap();
        assert_eq!(
            storage.find_least_loaded_available().await.unwrap().unwrap().id,
            b.id
        );
    }

    #[tokio::test]
    async fn duplicate_module_is_conflict() {
        let (_dir, storage) = open().await;
        storage.create_advisor(advisor(7, 1)).await.unwrap();
        let err = storage.create_advisor(advisor(7, 1)).await.unwrap_err();
        assert!(matches!(err, WicketError::Conflict(_)));
    }

    #[tokio::test]
    async fn offline_advisor_cannot_be_bound_and_comes_back_by_load() {
        let (_dir, storage) = open().await;
        let a = storage.create_advisor(advisor(3, 1)).await.unwrap();
        storage.try_bind(a.id).await.unwrap().unwrap();

        let off = storage
            .set_advisor_status(a.id, AdvisorStatus::Offline)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(off.status, AdvisorStatus::Offline);
        assert!(storage.try_bind(a.id).await.unwrap().is_none());

        let back = storage
            .set_advisor_status(a.id, AdvisorStatus::Available)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(back.status, AdvisorStatus::Busy);
    }

    #[tokio::test]
    async fn notifications_are_deduplicated_per_template() {
        let (_dir, storage) = open().await;
        let now = Utc::now();
        let ticket = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, Some("+56911112222")), 1, now))
            .await
            .unwrap();
        let new = NewNotification {
            ticket_id: ticket.id,
            template: NotificationTemplate::NextTurn,
            scheduled_at: now,
            created_at: now,
        };

        let first = storage
            .insert_notification_if_absent(new.clone())
            .await
            .unwrap()
            .unwrap();
        assert!(
            storage
                .insert_notification_if_absent(new.clone())
                .await
                .unwrap()
                .is_none()
        );

        assert!(storage.mark_sent(first.id, now, "m-1").await.unwrap());
        assert!(
            storage
                .insert_notification_if_absent(new)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn failed_attempts_reschedule_until_cap() {
        let (_dir, storage) = open().await;
        let now = Utc::now();
        let ticket = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, Some("+56911112222")), 1, now))
            .await
            .unwrap();
        let n = storage
            .insert_notification_if_absent(NewNotification {
                ticket_id: ticket.id,
                template: NotificationTemplate::YourTurn,
                scheduled_at: now,
                created_at: now,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(storage.list_pending_due(now).await.unwrap().len(), 1);

        let retry_at = now + Duration::minutes(5);
        let once = storage
            .record_failed_attempt(n.id, retry_at, 3)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(once.attempts, 1);
        assert_eq!(once.status, NotificationStatus::Pending);
        assert_eq!(once.scheduled_at, retry_at);

        assert!(storage.list_pending_due(retry_at).await.unwrap().is_empty());
        assert!(storage.list_retry_due(now, 3).await.unwrap().is_empty());
        assert_eq!(storage.list_retry_due(retry_at, 3).await.unwrap().len(), 1);

        storage.record_failed_attempt(n.id, retry_at, 3).await.unwrap();
        let last = storage
            .record_failed_attempt(n.id, retry_at, 3)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.attempts, 3);
        assert_eq!(last.status, NotificationStatus::Failed);

        assert!(
            storage
                .record_failed_attempt(n.id, retry_at, 3)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!storage.mark_sent(n.id, now, "late").await.unwrap());
    }

    #[tokio::test]
    async fn cancel_marks_only_pending_failed() {
        let (_dir, storage) = open().await;
        let now = Utc::now();
        let ticket = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, Some("+56911112222")), 1, now))
            .await
            .unwrap();
        let created = storage
            .insert_notification_if_absent(NewNotification {
                ticket_id: ticket.id,
                template: NotificationTemplate::TicketCreated,
                scheduled_at: now,
                created_at: now,
            })
            .await
            .unwrap()
            .unwrap();
        storage.mark_sent(created.id, now, "m-1").await.unwrap();
        storage
            .insert_notification_if_absent(NewNotification {
                ticket_id: ticket.id,
                template: NotificationTemplate::YourTurn,
                scheduled_at: now + Duration::hours(1),
                created_at: now,
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(storage.cancel_pending_for_ticket(ticket.id).await.unwrap(), 1);

        let all = storage.list_for_ticket(ticket.id).await.unwrap();
        assert_eq!(all[0].status, NotificationStatus::Sent);
        assert_eq!(all[1].status, NotificationStatus::Failed);
        assert_eq!(all[1].attempts, 0);
    }

    #[tokio::test]
    async fn lowered_cap_fails_notices_already_past_it() {
        let (_dir, storage) = open().await;
        let now = Utc::now();
        let ticket = storage
            .create_ticket(NewTicket::new(request(QueueType::Caja, Some("+56911112222")), 1, now))
            .await
            .unwrap();
        let mut notices = Vec::new();
        for template in [NotificationTemplate::TicketCreated, NotificationTemplate::YourTurn] {
            let n = storage
                .insert_notification_if_absent(NewNotification {
                    ticket_id: ticket.id,
                    template,
                    scheduled_at: now,
                    created_at: now,
                })
                .await
                .unwrap()
                .unwrap();
            notices.push(n);
        }
        // Two failures under a cap of five, one failure on the other.
        for _ in 0..2 {
            storage.record_failed_attempt(notices[0].id, now, 5).await.unwrap();
        }
        storage.record_failed_attempt(notices[1].id, now, 5).await.unwrap();

        // With the cap now at two, the first notice can never be retried.
        assert!(
            storage
                .list_retry_due(now, 2)
                .await
                .unwrap()
                .iter()
                .all(|n| n.id != notices[0].id)
        );
        assert_eq!(storage.fail_exhausted(2).await.unwrap(), 1);

        let all = storage.list_for_ticket(ticket.id).await.unwrap();
        assert_eq!(all[0].status, NotificationStatus::Failed);
        assert_eq!(all[0].attempts, 2);
        assert_eq!(all[1].status, NotificationStatus::Pending);
        assert_eq!(storage.fail_exhausted(2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn shutdown_checkpoints_and_closes() {
        let (_dir, storage) = open().await;
        storage
            .create_ticket(NewTicket::new(request(QueueType::Gerencia, None), 1, Utc::now()))
            .await
            .unwrap();
        storage.shutdown().await.unwrap();
    }
}
