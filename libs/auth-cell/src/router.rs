// libs/auth-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    // Registration, login and token validation are reachable without a
    // session; profile routes require one.
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/validate", get(handlers::validate));

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_profile))
        .route("/me", patch(handlers::update_profile))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
