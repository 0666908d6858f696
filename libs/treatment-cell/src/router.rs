// libs/treatment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn treatment_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/appointments/{appointment_id}", post(handlers::record_treatment))
        .route("/appointments/{appointment_id}", get(handlers::get_treatment))
        .route("/patients/{patient_id}/history", get(handlers::patient_treatment_history))
        .route("/doctor/patients/{patient_id}", get(handlers::doctor_patient_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
