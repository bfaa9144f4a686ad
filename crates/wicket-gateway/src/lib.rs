// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-over-HTTP API for the Wicket queue engine.
//!
//! Clients create tickets and follow their position; staff use the admin
//! routes to close tickets, watch the dashboard and take advisors on or
//! off duty.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod views;

pub use auth::AuthConfig;
pub use error::{ApiError, ErrorBody};
pub use server::{GatewayState, HealthState, ServerConfig, router, start_server};
