use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/users", get(handlers::users::get_user))
        .route("/clinic", get(handlers::clinic::get_clinic))
        .route("/parse_date", post(handlers::dates::parse_date))
        .route(
            "/first_session_variables",
            get(handlers::clinic::first_session_variables),
        )
        .route(
            "/recurring_session_variables",
            get(handlers::clinic::recurring_session_variables),
        )
        .route(
            "/book_appointment",
            post(handlers::appointments::book_appointment),
        )
        .route(
            "/latest_session",
            get(handlers::appointments::latest_session),
        )
        .route(
            "/reschedule_appointment",
            post(handlers::appointments::reschedule_appointment),
        )
        .route(
            "/cancel_appointment",
            post(handlers::appointments::cancel_appointment),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
