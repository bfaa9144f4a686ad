// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the Wicket queue engine.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered as Prometheus text via [`PrometheusAdapter::render`], which the
//! gateway serves on `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use wicket_core::{AdapterType, HealthStatus, PluginAdapter, WicketError};

pub use recording::{
    record_assignment, record_notifications, record_tick_duration, record_ticket_closed,
    record_ticket_created, set_active_tickets,
};

/// Installs the Prometheus recorder and keeps the handle used for rendering.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the recorder globally. Only one recorder can be installed
    /// per process; a second call returns an error.
    pub fn new() -> Result<Self, WicketError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            WicketError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, WicketError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WicketError> {
        Ok(())
    }
}
