use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::models::{DateRange, DateRequest};
use crate::services::ai::date_resolver::resolve_date_range;
use crate::state::AppState;

// POST /parse_date
pub async fn parse_date(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DateRequest>,
) -> Result<Json<DateRange>, AppError> {
    let range =
        resolve_date_range(state.llm.as_ref(), &req.message, &req.timezone, Utc::now()).await?;
    Ok(Json(range))
}
