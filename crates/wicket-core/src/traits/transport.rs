// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification transport capability.

use async_trait::async_trait;

use crate::error::WicketError;
use crate::traits::adapter::PluginAdapter;
use crate::types::MessageId;

/// Delivers a rendered text to a recipient over some channel.
///
/// The dispatcher bounds every call with its own timeout and treats any
/// error as a failed attempt.
#[async_trait]
pub trait NotificationTransport: PluginAdapter {
    async fn send(&self, recipient: &str, text: &str) -> Result<MessageId, WicketError>;
}
