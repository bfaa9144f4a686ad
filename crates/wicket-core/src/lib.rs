// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wicket queue engine.
//!
//! This crate provides the domain model (tickets, advisors, notifications,
//! queue types), the error type, the clock, and the trait seams that the
//! storage backends and notification transports implement.

pub mod advisor;
pub mod clock;
pub mod error;
pub mod notification;
pub mod queue;
pub mod ticket;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use advisor::{Advisor, AdvisorStatus, NewAdvisor};
pub use clock::{Clock, SystemClock};
pub use error::{FieldError, WicketError};
pub use notification::{NewNotification, Notification, NotificationStatus, NotificationTemplate};
pub use queue::QueueType;
pub use ticket::{NewTicket, Ticket, TicketRequest, TicketStatus};
pub use types::{AdapterType, AdvisorId, HealthStatus, MessageId, NotificationId, TicketId};

pub use traits::{
    AdvisorStore, NotificationStore, NotificationTransport, PeriodicTask, PluginAdapter,
    StorageAdapter, TicketStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Storage,
            AdapterType::Transport,
            AdapterType::Observability,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&TicketId(7)).expect("should serialize");
        assert_eq!(json, "7");
        let parsed: AdvisorId = serde_json::from_str("3").expect("should deserialize");
        assert_eq!(parsed, AdvisorId(3));
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_transport<T: NotificationTransport>() {}
        fn _assert_ticket_store<T: TicketStore>() {}
        fn _assert_advisor_store<T: AdvisorStore>() {}
        fn _assert_notification_store<T: NotificationStore>() {}
        fn _assert_task<T: PeriodicTask>() {}
    }
}
