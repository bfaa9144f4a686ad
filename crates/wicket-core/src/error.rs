// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Wicket queue engine.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::ticket::TicketStatus;

/// A single rejected input field, rendered as `field: message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The primary error type used across all Wicket crates.
#[derive(Debug, Error)]
pub enum WicketError {
    /// Malformed or missing input, rejected before any mutation.
    #[error("validation failed: {}", join_fields(.errors))]
    Validation { errors: Vec<FieldError> },

    /// Unknown ticket, advisor, or reference code.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Request conflicts with current state (policy or already-closed entity).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A ticket status change the lifecycle does not allow.
    #[error("invalid ticket transition: {from} -> {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Outbound notification transport errors.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WicketError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Transport and timeout failures count as a failed delivery attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_fields() {
        let err = WicketError::Validation {
            errors: vec![
                FieldError::new("nationalId", "must be 7-20 characters"),
                FieldError::new("branchOffice", "is required"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "validation failed: nationalId: must be 7-20 characters, branchOffice: is required"
        );
    }

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = WicketError::not_found("ticket", 42);
        assert_eq!(err.to_string(), "ticket not found: 42");
    }

    #[test]
    fn transient_classification() {
        assert!(WicketError::Timeout {
            duration: std::time::Duration::from_secs(10)
        }
        .is_transient());
        assert!(WicketError::Transport {
            message: "down".into(),
            source: None
        }
        .is_transient());
        assert!(!WicketError::Internal("bug".into()).is_transient());
    }

    #[test]
    fn invalid_transition_message() {
        let err = WicketError::InvalidTransition {
            from: TicketStatus::Completed,
            to: TicketStatus::Next,
        };
        assert_eq!(
            err.to_string(),
            "invalid ticket transition: COMPLETED -> NEXT"
        );
    }
}
