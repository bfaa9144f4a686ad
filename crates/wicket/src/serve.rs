// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wicket serve` command implementation.
//!
//! Opens SQLite storage, seeds the advisor pool, wires the notification
//! dispatcher to Telegram when a bot token is configured, then runs the
//! queue and delivery ticks alongside the HTTP gateway until SIGINT or
//! SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use wicket_config::model::WicketConfig;
use wicket_core::{
    HealthStatus, NotificationTransport, PeriodicTask, PluginAdapter, StorageAdapter, SystemClock,
    WicketError,
};
use wicket_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig};
use wicket_notify::NotificationDispatcher;
use wicket_prometheus::PrometheusAdapter;
use wicket_queue::{AdvisorPool, QueueCoordinator};
use wicket_scheduler::{Scheduler, shutdown};
use wicket_storage::SqliteStorage;
use wicket_telegram::TelegramTransport;

/// Runs the `wicket serve` command.
pub async fn run_serve(config: WicketConfig) -> Result<(), WicketError> {
    init_tracing(&config.logging.level);

    info!("starting wicket serve");

    let prometheus = if config.prometheus.enabled {
        Some(Arc::new(PrometheusAdapter::new()?))
    } else {
        None
    };

    let storage = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    info!(path = %config.storage.database_path, "storage ready");

    let clock = Arc::new(SystemClock);

    let pool = Arc::new(AdvisorPool::new(
        storage.clone(),
        clock.clone(),
        config.queue.default_advisor_capacity,
    ));
    let seeded = pool.seed(&config.advisors).await?;
    info!(seeded, configured = config.advisors.len(), "advisor pool ready");

    let transport = init_transport(&config).await?;

    let mut dispatcher = NotificationDispatcher::new(
        config.notification.clone(),
        storage.clone(),
        storage.clone(),
        clock.clone(),
    );
    if let Some(transport) = &transport {
        dispatcher = dispatcher.with_transport(transport.clone());
    }
    let dispatcher = Arc::new(dispatcher);

    let coordinator = Arc::new(QueueCoordinator::new(
        storage.clone(),
        pool,
        dispatcher.clone(),
        clock,
        config.queue.clone(),
    ));

    let cancel = shutdown::install_signal_handler();

    let queue_task: Arc<dyn PeriodicTask> = coordinator.clone();
    let mut scheduler = Scheduler::new(cancel.clone()).every(
        Duration::from_secs(config.scheduler.queue_tick_secs),
        queue_task,
    );
    if dispatcher.has_transport() {
        let delivery_task: Arc<dyn PeriodicTask> = dispatcher.clone();
        scheduler = scheduler.every(
            Duration::from_secs(config.scheduler.delivery_tick_secs),
            delivery_task,
        );
    } else {
        warn!("no notification transport configured, delivery loop not started");
    }
    let tasks = scheduler.start();

    if config.gateway.enabled {
        let prometheus_render = prometheus.clone().map(|p| {
            Arc::new(move || p.render()) as Arc<dyn Fn() -> String + Send + Sync>
        });
        let state = GatewayState {
            coordinator,
            auth: AuthConfig {
                admin_token: config.gateway.admin_token.clone(),
            },
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render,
            },
        };
        let server = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
        };
        if let Err(e) = wicket_gateway::start_server(&server, state, cancel.clone()).await {
            error!(error = %e, "gateway failed, shutting down");
            cancel.cancel();
        }
    } else {
        info!("gateway disabled");
        cancel.cancelled().await;
    }

    info!("shutdown requested, waiting for periodic tasks");
    tasks.join().await;

    if let Some(transport) = &transport
        && let Err(e) = transport.shutdown().await
    {
        warn!(error = %e, "transport shutdown failed");
    }
    storage.close().await?;

    info!("wicket stopped");
    Ok(())
}

/// Builds the Telegram transport when a bot token is configured.
///
/// An unreachable Bot API at startup is logged but not fatal; failed
/// sends are retried by the delivery loop.
async fn init_transport(
    config: &WicketConfig,
) -> Result<Option<Arc<dyn NotificationTransport>>, WicketError> {
    if config.telegram.bot_token.is_none() {
        return Ok(None);
    }

    let transport = TelegramTransport::new(config.telegram.clone())?;
    match transport.health_check().await? {
        HealthStatus::Healthy => info!("telegram transport ready"),
        HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
            warn!(%reason, "telegram transport not healthy at startup")
        }
    }
    Ok(Some(Arc::new(transport)))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wicket={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
