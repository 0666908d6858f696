// libs/admin-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_utils::guard::{authorize, RequiredRole};

use crate::models::SearchParams;
use crate::services::reporting::ReportingService;

#[axum::debug_handler]
pub async fn dashboard_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let service = ReportingService::new(&state);
    let stats = service.dashboard_stats(auth.token()).await?;

    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn search(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<SearchParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let service = ReportingService::new(&state);
    let results = service
        .search_people(params.kind, &params.q, auth.token())
        .await?;

    Ok(Json(json!({
        "results": results,
        "total": results.len()
    })))
}
