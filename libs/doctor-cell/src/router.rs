// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_active_doctors))
        .route("/", post(handlers::add_doctor))
        .route("/availability", post(handlers::create_availability))
        .route("/availability/{slot_id}", patch(handlers::update_availability))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}", patch(handlers::update_doctor))
        .route("/{doctor_id}/deactivate", post(handlers::deactivate_doctor))
        .route("/{doctor_id}/availability", get(handlers::doctor_availability))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

pub fn department_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_departments))
        .route("/", post(handlers::create_department))
        .route("/{department_id}/doctors", get(handlers::doctors_by_department))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
