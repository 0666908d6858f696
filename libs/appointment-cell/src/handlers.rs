// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_models::person::Role;
use shared_utils::guard::{authorize, RequiredRole};

use crate::models::{BookAppointmentRequest, SetStatusRequest};
use crate::services::booking::AppointmentBookingService;

#[derive(Debug, Deserialize)]
pub struct UpcomingQueryParams {
    pub as_of: Option<NaiveDate>,
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

/// Patient books an appointment for themselves.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::Patient)?;

    if let Some(patient_id) = request.patient_id {
        if patient_id != user.id {
            return Err(AppError::Forbidden(
                "Patients can only book their own appointments".to_string(),
            ));
        }
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .book_appointment(user.id, &request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

/// Admin books an appointment on behalf of a patient.
#[axum::debug_handler]
pub async fn admin_book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let patient_id = request.patient_id.ok_or_else(|| {
        AppError::ValidationError("patient_id is required when booking as admin".to_string())
    })?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .book_appointment(patient_id, &request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    // Ownership (owning patient or admin) is enforced by the service.
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let booking_service = AppointmentBookingService::new(&state);
    let cancelled = booking_service
        .cancel_appointment(appointment_id, user, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": cancelled,
        "message": "Appointment cancelled successfully"
    })))
}

/// Assigned doctor advances the appointment status; completing also records
/// the treatment in the same transaction.
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::Doctor)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .set_status(appointment_id, user, &request, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

// ==============================================================================
// LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .get_appointment(appointment_id, auth.token())
        .await?;

    // Only the involved patient, the involved doctor, or an admin may view.
    let involved = appointment.patient_id == user.id || appointment.doctor_id == user.id;
    if !involved && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    authorize(Some(&user), RequiredRole::Admin)?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service.all_appointments(auth.token()).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

/// Upcoming appointments scoped by role: patients and doctors see their own,
/// admins see everything.
#[axum::debug_handler]
pub async fn upcoming_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<UpcomingQueryParams>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let as_of = params.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let (patient_id, doctor_id) = match user.role {
        Role::Admin => (None, None),
        Role::Doctor => (None, Some(user.id)),
        Role::Patient => (Some(user.id), None),
    };

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .upcoming_appointments(as_of, patient_id, doctor_id, auth.token())
        .await?;

    Ok(Json(json!({
        "upcoming_appointments": appointments,
        "total": appointments.len(),
        "as_of": as_of
    })))
}

#[axum::debug_handler]
pub async fn patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let is_own = patient_id == user.id && user.role == Role::Patient;
    if !is_own && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to view appointments for this patient".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .appointments_for_patient(patient_id, auth.token())
        .await?;

    Ok(Json(json!({
        "patient_id": patient_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let user = authorize(Some(&user), RequiredRole::AnyAuthenticated)?;

    let is_own = doctor_id == user.id && user.role == Role::Doctor;
    if !is_own && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to view appointments for this doctor".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .appointments_for_doctor(doctor_id, auth.token())
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}
