use std::sync::Arc;

use axum::{routing::get, Router};

use admin_cell::router::admin_routes;
use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::{department_routes, doctor_routes};
use shared_config::AppConfig;
use treatment_cell::router::treatment_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Hospital API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/departments", department_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/treatments", treatment_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}
