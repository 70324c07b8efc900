use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::models::{SessionKind, SessionType, SessionVariables};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ClinicResponse {
    name: String,
    first_session_type: SessionType,
    first_session_username: String,
    #[serde(rename = "first_session_eventTypeSlug")]
    first_session_event_type_slug: String,
    recurring_session_type: SessionType,
    recurring_session_username: String,
    #[serde(rename = "recurring_session_eventTypeSlug")]
    recurring_session_event_type_slug: String,
    insurance_submission_link: String,
}

// GET /clinic
pub async fn get_clinic(State(state): State<Arc<AppState>>) -> Json<ClinicResponse> {
    let clinic = &state.config.clinic;
    Json(ClinicResponse {
        name: clinic.name.clone(),
        first_session_type: clinic.first_session.session_type,
        first_session_username: clinic.first_session.username.clone(),
        first_session_event_type_slug: clinic.first_session.event_type_slug.clone(),
        recurring_session_type: clinic.recurring_session.session_type,
        recurring_session_username: clinic.recurring_session.username.clone(),
        recurring_session_event_type_slug: clinic.recurring_session.event_type_slug.clone(),
        insurance_submission_link: clinic.insurance_submission_link.clone(),
    })
}

// GET /first_session_variables
pub async fn first_session_variables(
    State(state): State<Arc<AppState>>,
) -> Json<SessionVariables> {
    Json(state.config.clinic.variables_for(SessionKind::First))
}

// GET /recurring_session_variables
pub async fn recurring_session_variables(
    State(state): State<Arc<AppState>>,
) -> Json<SessionVariables> {
    Json(state.config.clinic.variables_for(SessionKind::Recurring))
}
