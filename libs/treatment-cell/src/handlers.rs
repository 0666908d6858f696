// libs/treatment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_models::person::Role;
use shared_utils::guard::{authorize, RequiredRole};

use crate::models::RecordTreatmentRequest;
use crate::services::recording::TreatmentRecordingService;

/// Doctor records (or re-records) the treatment for a completed appointment.
#[axum::debug_handler]
pub async fn record_treatment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<RecordTreatmentRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::Doctor)?;

    let service = TreatmentRecordingService::new(&state);
    let treatment = service
        .record_treatment(appointment_id, user, &request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "treatment": treatment,
        "message": "Treatment recorded successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_treatment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let service = TreatmentRecordingService::new(&state);
    let treatment = service
        .treatment_for_appointment(appointment_id, user, auth.token())
        .await?;

    Ok(Json(json!(treatment)))
}

/// A patient's treatment history: the patient themselves or an admin.
#[axum::debug_handler]
pub async fn patient_treatment_history(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let is_own = patient_id == user.id && user.role == Role::Patient;
    if !is_own && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to view this patient's treatment history".to_string(),
        ));
    }

    let service = TreatmentRecordingService::new(&state);
    let treatments = service.patient_history(patient_id, auth.token()).await?;

    Ok(Json(json!({
        "patient_id": patient_id,
        "treatments": treatments,
        "total": treatments.len()
    })))
}

/// Doctor-side view of one patient's records; the service rejects doctors
/// who never had an appointment with the patient.
#[axum::debug_handler]
pub async fn doctor_patient_history(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::Doctor)?;

    let service = TreatmentRecordingService::new(&state);
    let treatments = service
        .doctor_patient_history(user, patient_id, auth.token())
        .await?;

    Ok(Json(json!({
        "patient_id": patient_id,
        "treatments": treatments,
        "total": treatments.len()
    })))
}
