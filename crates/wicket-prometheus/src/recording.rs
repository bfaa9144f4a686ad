// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade, so without an installed recorder every call
//! here is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Wicket metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("wicket_tickets_created_total", "Tickets issued, by queue");
    describe_counter!(
        "wicket_tickets_closed_total",
        "Tickets that reached a terminal status, by queue and outcome"
    );
    describe_counter!(
        "wicket_assignments_total",
        "Tickets bound to an advisor, by queue"
    );
    describe_counter!(
        "wicket_notifications_total",
        "Notification outcomes (scheduled, sent, retried, failed, cancelled)"
    );
    describe_gauge!("wicket_active_tickets", "Active tickets per queue");
    describe_histogram!(
        "wicket_tick_duration_seconds",
        "Duration of one periodic task run, by task"
    );
}

pub fn record_ticket_created(queue: &str) {
    metrics::counter!("wicket_tickets_created_total", "queue" => queue.to_string()).increment(1);
}

pub fn record_ticket_closed(queue: &str, outcome: &str) {
    metrics::counter!(
        "wicket_tickets_closed_total",
        "queue" => queue.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_assignment(queue: &str) {
    metrics::counter!("wicket_assignments_total", "queue" => queue.to_string()).increment(1);
}

/// Record notification outcomes; `outcome` is one of scheduled, sent,
/// retried, failed, cancelled.
pub fn record_notifications(outcome: &'static str, count: u64) {
    if count > 0 {
        metrics::counter!("wicket_notifications_total", "outcome" => outcome).increment(count);
    }
}

pub fn set_active_tickets(queue: &str, count: f64) {
    metrics::gauge!("wicket_active_tickets", "queue" => queue.to_string()).set(count);
}

pub fn record_tick_duration(task: &str, seconds: f64) {
    metrics::histogram!("wicket_tick_duration_seconds", "task" => task.to_string())
        .record(seconds);
}
