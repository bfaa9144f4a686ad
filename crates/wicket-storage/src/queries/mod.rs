// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for tickets, advisors, and notifications.

pub mod advisors;
pub mod notifications;
pub mod tickets;
