// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{SessionUser, TokenResponse};
use shared_models::error::AppError;
use shared_utils::guard::{authorize, RequiredRole};
use shared_utils::jwt::validate_token;

use crate::models::{LoginRequest, RegisterRequest, UpdateProfileRequest};
use crate::services::account::AccountService;

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

/// Patient self-registration. Public route.
#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&state);
    let person = service.register(&request).await?;

    Ok(Json(json!({
        "success": true,
        "person": person,
        "message": "Registration successful! Please log in."
    })))
}

/// Credential check and token mint. Public route.
#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&state);
    let response = service.login(&request).await?;

    Ok(Json(json!({
        "success": true,
        "token": response.token,
        "person": response.person,
        "message": format!("Welcome back, {}!", response.person.full_name)
    })))
}

#[axum::debug_handler]
pub async fn validate(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    match validate_token(&token, &config.jwt_secret) {
        Ok(user) => Ok(Json(TokenResponse {
            valid: true,
            person_id: user.id,
            username: user.username,
            role: user.role,
        })),
        Err(err) => Err(AppError::Auth(err)),
    }
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let service = AccountService::new(&state);
    let person = service.get_profile(user.id, auth.token()).await?;

    Ok(Json(json!(person)))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let service = AccountService::new(&state);
    let person = service
        .update_profile(user.id, &request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "person": person,
        "message": "Profile updated successfully"
    })))
}
