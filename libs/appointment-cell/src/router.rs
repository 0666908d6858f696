// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/", get(handlers::list_appointments))
        .route("/admin", post(handlers::admin_book_appointment))
        .route("/upcoming", get(handlers::upcoming_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/patients/{patient_id}", get(handlers::patient_appointments))
        .route("/doctors/{doctor_id}", get(handlers::doctor_appointments))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
