// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Wicket integration tests.
//!
//! Provides in-process stand-ins for the engine's collaborators so queue
//! and delivery scenarios run deterministically without a network.
//!
//! # Components
//!
//! - [`MemoryStore`] - ticket, advisor and notification stores in memory
//! - [`MockTransport`] - notification transport with scripted outcomes
//! - [`ManualClock`] - clock that only moves when told to
//! - [`TestHarness`] - the full engine wired to the above

pub mod clock;
pub mod harness;
pub mod memory_store;
pub mod mock_transport;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::MemoryStore;
pub use mock_transport::{MockTransport, SendOutcome, SentMessage};
