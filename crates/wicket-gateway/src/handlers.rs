// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the ticket and admin API.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wicket_core::{AdvisorId, AdvisorStatus, TicketId, WicketError};
use wicket_queue::{CreateTicket, Dashboard, PositionView};

use crate::error::ApiError;
use crate::server::GatewayState;
use crate::views::{AdvisorView, TicketView};

type ApiResult<T> = Result<T, ApiError>;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Request body for PUT /api/admin/advisors/{id}/status.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: AdvisorStatus,
}

/// Turns a body that failed to parse into a validation error.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError(WicketError::invalid("body", rejection.body_text())))
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError(WicketError::invalid("id", "must be a number")))
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text exposition, or 404 when metrics are disabled.
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /api/tickets
pub async fn post_ticket(
    State(state): State<GatewayState>,
    payload: Result<Json<CreateTicket>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketView>)> {
    let request = body(payload)?;
    let ticket = state.coordinator.create_ticket(request).await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

/// GET /api/tickets/{number}/position
pub async fn get_position(
    State(state): State<GatewayState>,
    Path(number): Path<String>,
) -> ApiResult<Json<PositionView>> {
    Ok(Json(state.coordinator.position_of(&number).await?))
}

/// GET /api/tickets/reference/{code}
pub async fn get_by_reference(
    State(state): State<GatewayState>,
    Path(code): Path<String>,
) -> ApiResult<Json<TicketView>> {
    let reference = Uuid::parse_str(&code)
        .map_err(|_| ApiError(WicketError::invalid("referenceCode", "must be a UUID")))?;
    let ticket = state.coordinator.find_by_reference(reference).await?;
    Ok(Json(ticket.into()))
}

/// GET /api/admin/dashboard
pub async fn get_dashboard(State(state): State<GatewayState>) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.coordinator.dashboard().await?))
}

/// POST /api/admin/tickets/{id}/complete
///
/// 204 once served. Only an InService ticket can complete; a Waiting or
/// Next ticket answers 409 and should be cancelled instead.
pub async fn complete_ticket(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = TicketId(parse_id(&id)?);
    state.coordinator.complete_ticket(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/tickets/{id}/cancel
pub async fn cancel_ticket(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = TicketId(parse_id(&id)?);
    state.coordinator.cancel_ticket(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/tickets/{id}/no-show
///
/// 409 unless the ticket is Next or InService.
pub async fn no_show_ticket(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = TicketId(parse_id(&id)?);
    state.coordinator.mark_no_show(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/advisors
pub async fn list_advisors(State(state): State<GatewayState>) -> ApiResult<Json<Vec<AdvisorView>>> {
    let advisors = state.coordinator.pool().list().await?;
    Ok(Json(advisors.into_iter().map(AdvisorView::from).collect()))
}

/// PUT /api/admin/advisors/{id}/status
pub async fn put_advisor_status(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<AdvisorView>> {
    let id = AdvisorId(parse_id(&id)?);
    let StatusRequest { status } = body(payload)?;
    let advisor = state.coordinator.pool().set_status(id, status).await?;
    Ok(Json(advisor.into()))
}
