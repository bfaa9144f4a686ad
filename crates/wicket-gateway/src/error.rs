// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`WicketError`] to JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use wicket_core::WicketError;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    /// `field: message` entries for validation failures, empty otherwise.
    pub errors: Vec<String>,
}

/// Handler error; renders as [`ErrorBody`] with the matching status code.
#[derive(Debug)]
pub struct ApiError(pub WicketError);

impl From<WicketError> for ApiError {
    fn from(e: WicketError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WicketError::Validation { .. } => StatusCode::BAD_REQUEST,
            WicketError::NotFound { .. } => StatusCode::NOT_FOUND,
            WicketError::Conflict(_) | WicketError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self.0 {
            WicketError::Validation { errors } => (
                "validation failed".to_string(),
                errors.iter().map(ToString::to_string).collect(),
            ),
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %e, "request failed");
                ("internal server error".to_string(), Vec::new())
            }
            e => (e.to_string(), Vec::new()),
        };

        let body = ErrorBody {
            message,
            status: status.as_u16(),
            timestamp: Utc::now(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use wicket_core::{FieldError, TicketStatus};

    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (WicketError::invalid("phone", "bad"), StatusCode::BAD_REQUEST),
            (WicketError::not_found("ticket", 1), StatusCode::NOT_FOUND),
            (WicketError::Conflict("closed".into()), StatusCode::CONFLICT),
            (
                WicketError::InvalidTransition {
                    from: TicketStatus::Waiting,
                    to: TicketStatus::Completed,
                },
                StatusCode::CONFLICT,
            ),
            (
                WicketError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn validation_lists_fields() {
        let response = ApiError(WicketError::Validation {
            errors: vec![
                FieldError::new("nationalId", "is required"),
                FieldError::new("queueType", "is required"),
            ],
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
