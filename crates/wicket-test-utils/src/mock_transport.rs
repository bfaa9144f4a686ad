// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification transport with scripted outcomes.
//!
//! Each `send` pops the next scripted [`SendOutcome`]; once the script is
//! empty every send succeeds. Every call is captured, including failed
//! ones, so tests can assert the transport was (or was never) invoked.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use wicket_core::{
    AdapterType, HealthStatus, MessageId, NotificationTransport, PluginAdapter, WicketError,
};

/// What the next `send` call does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Deliver,
    Fail(String),
    /// Sleeps before succeeding; longer than the dispatcher timeout means a timeout.
    Stall(Duration),
}

/// One captured `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub text: String,
    pub delivered: bool,
}

#[derive(Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<SendOutcome>>>,
    calls: Arc<Mutex<Vec<SentMessage>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends outcomes for the next calls, in order.
    pub async fn script(&self, outcomes: impl IntoIterator<Item = SendOutcome>) {
        self.script.lock().await.extend(outcomes);
    }

    pub async fn fail_next(&self, times: usize) {
        self.script(std::iter::repeat_n(SendOutcome::Fail("scripted failure".into()), times))
            .await;
    }

    /// Every call, successful or not.
    pub async fn calls(&self) -> Vec<SentMessage> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn delivered(&self) -> Vec<SentMessage> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|m| m.delivered)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, WicketError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WicketError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationTransport for MockTransport {
    async fn send(&self, recipient: &str, text: &str) -> Result<MessageId, WicketError> {
        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or(SendOutcome::Deliver);

        if let SendOutcome::Stall(delay) = outcome {
            tokio::time::sleep(delay).await;
        }
        let delivered = !matches!(outcome, SendOutcome::Fail(_));

        let mut calls = self.calls.lock().await;
        calls.push(SentMessage {
            recipient: recipient.to_string(),
            text: text.to_string(),
            delivered,
        });

        match outcome {
            SendOutcome::Fail(message) => Err(WicketError::Transport {
                message,
                source: None,
            }),
            _ => Ok(MessageId(format!("mock-msg-{}", calls.len()))),
        }
    }
}
