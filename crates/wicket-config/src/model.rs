// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Wicket queue engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Wicket configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WicketConfig {
    /// Queue coordination settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Notification scheduling and delivery settings.
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Background tick intervals.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Telegram notification transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Advisors registered at startup (`[[advisors]]` array).
    #[serde(default)]
    pub advisors: Vec<AdvisorSeedConfig>,
}

/// Queue coordination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Waiting tickets at or above this position are promoted to Next.
    #[serde(default = "default_promotion_threshold")]
    pub promotion_threshold: u32,

    /// Simultaneous tickets per advisor before it flips to Busy, unless the
    /// advisor entry sets its own capacity.
    #[serde(default = "default_advisor_capacity")]
    pub default_advisor_capacity: u32,

    /// Reject a new ticket when the national id already holds an active one.
    #[serde(default)]
    pub one_active_ticket_per_client: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            promotion_threshold: default_promotion_threshold(),
            default_advisor_capacity: default_advisor_capacity(),
            one_active_ticket_per_client: false,
        }
    }
}

fn default_promotion_threshold() -> u32 {
    3
}

fn default_advisor_capacity() -> u32 {
    1
}

/// Notification scheduling and delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Total delivery attempts before a notice is permanently Failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before retrying a failed delivery.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    /// Upper bound on a single transport call.
    #[serde(default = "default_transport_timeout_secs")]
    pub transport_timeout_secs: u64,

    #[serde(default = "default_ticket_created_delay_secs")]
    pub ticket_created_delay_secs: u64,

    #[serde(default = "default_next_turn_delay_secs")]
    pub next_turn_delay_secs: u64,

    #[serde(default)]
    pub your_turn_delay_secs: u64,
}

impl NotificationConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_secs(self.transport_timeout_secs)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_secs: default_retry_backoff_secs(),
            transport_timeout_secs: default_transport_timeout_secs(),
            ticket_created_delay_secs: default_ticket_created_delay_secs(),
            next_turn_delay_secs: default_next_turn_delay_secs(),
            your_turn_delay_secs: 0,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_secs() -> u64 {
    300
}

fn default_transport_timeout_secs() -> u64 {
    10
}

fn default_ticket_created_delay_secs() -> u64 {
    60
}

fn default_next_turn_delay_secs() -> u64 {
    120
}

/// Background tick intervals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Interval between queue recomputation/assignment ticks.
    #[serde(default = "default_queue_tick_secs")]
    pub queue_tick_secs: u64,

    /// Interval between notification delivery ticks.
    #[serde(default = "default_delivery_tick_secs")]
    pub delivery_tick_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_tick_secs: default_queue_tick_secs(),
            delivery_tick_secs: default_delivery_tick_secs(),
        }
    }
}

fn default_queue_tick_secs() -> u64 {
    5
}

fn default_delivery_tick_secs() -> u64 {
    60
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("wicket").join("wicket.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("wicket.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for `/api/admin/*`. Admin routes reject every request
    /// while this is unset.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            admin_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

/// Telegram notification transport configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables notification delivery.
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the recorder and expose `/metrics` on the gateway.
    #[serde(default = "default_prometheus_enabled")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: default_prometheus_enabled(),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    true
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One advisor registered at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdvisorSeedConfig {
    pub name: String,

    #[serde(default)]
    pub email: String,

    /// Service window number shown to clients. Unique across advisors.
    pub module_number: u32,

    /// Overrides `queue.default_advisor_capacity` for this advisor.
    #[serde(default)]
    pub capacity: Option<u32>,
}
