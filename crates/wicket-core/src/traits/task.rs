// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::WicketError;

/// A unit of background work the scheduler runs on a fixed interval.
#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run_once(&self) -> Result<(), WicketError>;
}
