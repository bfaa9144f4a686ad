// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use wicket_config::model::AdvisorSeedConfig;
use wicket_core::{AdvisorId, AdvisorStatus, WicketError};
use wicket_queue::AdvisorPool;
use wicket_test_utils::{ManualClock, MemoryStore};

fn seed(name: &str, module: u32, capacity: Option<u32>) -> AdvisorSeedConfig {
    AdvisorSeedConfig {
        name: name.to_string(),
        email: format!("{}@branch.test", name.to_lowercase()),
        module_number: module,
        capacity,
    }
}

async fn pool_with(seeds: &[AdvisorSeedConfig]) -> AdvisorPool {
    let pool = AdvisorPool::new(
        Arc::new(MemoryStore::new()),
        Arc::new(ManualClock::morning()),
        1,
    );
    pool.seed(seeds).await.unwrap();
    pool
}

#[tokio::test]
async fn seeding_is_idempotent_by_module() {
    let seeds = [seed("Ana", 1, None), seed("Luis", 2, Some(2))];
    let pool = pool_with(&seeds).await;

    assert_eq!(pool.seed(&seeds).await.unwrap(), 0);
    assert_eq!(pool.seed(&[seed("Someone Else", 1, None)]).await.unwrap(), 0);

    let advisors = pool.list().await.unwrap();
    assert_eq!(advisors.len(), 2);
    assert_eq!(advisors[0].name, "Ana");
    assert_eq!(advisors[0].capacity, 1);
    assert_eq!(advisors[1].capacity, 2);
}

#[tokio::test]
async fn least_loaded_prefers_lowest_id_on_ties() {
    let pool = pool_with(&[seed("Ana", 1, Some(2)), seed("Luis", 2, Some(2))]).await;

    let first = pool.find_least_loaded_available().await.unwrap().unwrap();
    assert_eq!(first.module_number, 1);

    pool.bind(first.id).await.unwrap().unwrap();
    let next = pool.find_least_loaded_available().await.unwrap().unwrap();
    assert_eq!(next.module_number, 2);
}

#[tokio::test]
async fn bind_fails_once_busy() {
    let pool = pool_with(&[seed("Ana", 1, None)]).await;
    let ana = pool.list().await.unwrap().remove(0);

    let bound = pool.bind(ana.id).await.unwrap().unwrap();
    assert_eq!(bound.status, AdvisorStatus::Busy);
    assert!(pool.bind(ana.id).await.unwrap().is_none());
    assert!(pool.find_least_loaded_available().await.unwrap().is_none());

    let released = pool.release(ana.id).await.unwrap();
    assert_eq!(released.assigned_tickets, 0);
    assert_eq!(released.status, AdvisorStatus::Available);
}

#[tokio::test]
async fn release_never_goes_negative() {
    let pool = pool_with(&[seed("Ana", 1, None)]).await;
    let ana = pool.list().await.unwrap().remove(0);

    let released = pool.release(ana.id).await.unwrap();
    assert_eq!(released.assigned_tickets, 0);
    assert_eq!(released.status, AdvisorStatus::Available);
}

#[tokio::test]
async fn release_keeps_offline_advisors_offline() {
    let pool = pool_with(&[seed("Ana", 1, None)]).await;
    let ana = pool.list().await.unwrap().remove(0);
    pool.bind(ana.id).await.unwrap().unwrap();
    pool.set_status(ana.id, AdvisorStatus::Offline).await.unwrap();

    let released = pool.release(ana.id).await.unwrap();
    assert_eq!(released.assigned_tickets, 0);
    assert_eq!(released.status, AdvisorStatus::Offline);
}

#[tokio::test]
async fn coming_back_at_capacity_is_busy() {
    let pool = pool_with(&[seed("Ana", 1, None)]).await;
    let ana = pool.list().await.unwrap().remove(0);
    pool.bind(ana.id).await.unwrap().unwrap();

    pool.set_status(ana.id, AdvisorStatus::Offline).await.unwrap();
    let back = pool
        .set_status(ana.id, AdvisorStatus::Available)
        .await
        .unwrap();
    assert_eq!(back.status, AdvisorStatus::Busy);
}

#[tokio::test]
async fn busy_cannot_be_set_directly() {
    let pool = pool_with(&[seed("Ana", 1, None)]).await;
    let ana = pool.list().await.unwrap().remove(0);

    let err = pool
        .set_status(ana.id, AdvisorStatus::Busy)
        .await
        .unwrap_err();
    assert!(matches!(err, WicketError::Validation { .. }));
}

#[tokio::test]
async fn unknown_advisor_is_not_found() {
    let pool = pool_with(&[]).await;
    assert!(matches!(
        pool.release(AdvisorId(9)).await.unwrap_err(),
        WicketError::NotFound { .. }
    ));
    assert!(matches!(
        pool.set_status(AdvisorId(9), AdvisorStatus::Offline)
            .await
            .unwrap_err(),
        WicketError::NotFound { .. }
    ));
    assert!(pool.bind(AdvisorId(9)).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_binds_never_overbook() {
    let pool = Arc::new(pool_with(&[seed("Ana", 1, Some(3))]).await);
    let ana = pool.list().await.unwrap().remove(0);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.bind(ana.id).await }));
    }
    let mut bound = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_some() {
            bound += 1;
        }
    }

    assert_eq!(bound, 3);
    let ana = pool.find(ana.id).await.unwrap();
    assert_eq!(ana.assigned_tickets, 3);
    assert_eq!(ana.status, AdvisorStatus::Busy);
}
