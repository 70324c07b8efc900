use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{BookAppointmentParams, CancelParams, LatestSessionQuery, RescheduleParams};
use crate::services::session;
use crate::state::AppState;

// Vendor bodies are returned as-is, whether or not the vendor reported success.

// POST /book_appointment
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BookAppointmentParams>,
) -> Result<Json<Value>, AppError> {
    tracing::info!(phone = %params.phone_number, start = %params.start_datetime, "booking appointment");
    let response = session::book_appointment(&state, &params).await?;
    Ok(Json(response.body))
}

// GET /latest_session
pub async fn latest_session(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestSessionQuery>,
) -> Result<Json<Value>, AppError> {
    let latest = state
        .scheduler
        .latest_matching_booking(&query.email, &query.username, &query.event_type_slug)
        .await
        .map_err(|e| AppError::Upstream(format!("{e:#}")))?;

    Ok(Json(latest.into_body()))
}

// POST /reschedule_appointment
pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RescheduleParams>,
) -> Result<Json<Value>, AppError> {
    let response = session::reschedule_appointment(&state, &params).await?;
    Ok(Json(response.body))
}

// POST /cancel_appointment
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CancelParams>,
) -> Result<Json<Value>, AppError> {
    let response = session::cancel_appointment(&state, &params).await?;
    Ok(Json(response.body))
}
