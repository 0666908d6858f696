// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_utils::guard::{authorize, RequiredRole};

use crate::models::{
    CreateAvailabilityRequest, CreateDepartmentRequest, CreateDoctorRequest,
    UpdateAvailabilityRequest, UpdateDoctorRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::department::DepartmentService;
use crate::services::roster::RosterService;

#[derive(Debug, Deserialize)]
pub struct DoctorListParams {
    pub department_id: Option<Uuid>,
}

// ==============================================================================
// ROSTER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_active_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<DoctorListParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let roster = RosterService::new(&state);
    let doctors = roster
        .active_doctors(params.department_id, auth.token())
        .await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let roster = RosterService::new(&state);
    let doctor = roster.get_doctor(doctor_id, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn add_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let roster = RosterService::new(&state);
    let doctor = roster.add_doctor(&request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor added successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let roster = RosterService::new(&state);
    let doctor = roster
        .update_doctor(doctor_id, &request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor updated successfully"
    })))
}

/// Soft removal; the doctor disappears from active listings while their
/// appointment and treatment history stays intact.
#[axum::debug_handler]
pub async fn deactivate_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let roster = RosterService::new(&state);
    roster.deactivate_doctor(doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor removed from system"
    })))
}

// ==============================================================================
// DEPARTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let departments = DepartmentService::new(&state)
        .list_departments(auth.token())
        .await?;

    Ok(Json(json!({
        "departments": departments,
        "total": departments.len()
    })))
}

#[axum::debug_handler]
pub async fn create_department(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let department = DepartmentService::new(&state)
        .create_department(&request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "department": department,
        "message": "Department created successfully"
    })))
}

#[axum::debug_handler]
pub async fn doctors_by_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let roster = RosterService::new(&state);
    let doctors = roster
        .active_doctors(Some(department_id), auth.token())
        .await?;

    Ok(Json(json!({
        "department_id": department_id,
        "doctors": doctors,
        "total": doctors.len()
    })))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::Doctor)?;

    let service = AvailabilityService::new(&state);
    let slot = service.create_slot(user, &request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "availability": slot,
        "message": "Availability added successfully"
    })))
}

#[axum::debug_handler]
pub async fn doctor_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let service = AvailabilityService::new(&state);
    let slots = service.slots_for_doctor(doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "availability": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<AppConfig>>,
    Path(slot_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::Doctor)?;

    let service = AvailabilityService::new(&state);
    let slot = service
        .set_slot_availability(slot_id, user, request.is_available, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "availability": slot,
        "message": "Availability updated successfully"
    })))
}
