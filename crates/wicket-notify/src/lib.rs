// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification scheduling and delivery for the Wicket queue engine.
//!
//! [`NotificationDispatcher`] turns queue events into Pending notices and
//! drives them to Sent or Failed against a [`wicket_core::NotificationTransport`].

pub mod dispatcher;
pub mod template;

pub use dispatcher::{DeliveryReport, NotificationDispatcher};
pub use template::render;
