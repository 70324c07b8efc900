use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::UserRecord;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserQuery {
    pub phone: String,
}

// GET /users?phone=
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserRecord>, AppError> {
    if query.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone must not be empty".to_string()));
    }

    let user = state.registry()?.lookup_or_create(&query.phone)?;
    Ok(Json(user))
}
