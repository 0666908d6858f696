// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Booked,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Completed and Cancelled have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "Booked"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking input as it arrives from the presentation layer. Date and time
/// come in as strings and are parsed by the service so that malformed values
/// surface as InvalidInput rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Uuid,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub status: AppointmentStatus,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("This time slot is already booked")]
    Conflict,

    #[error("Not allowed to modify this appointment")]
    Forbidden,

    #[error("Appointment is already {0}")]
    AlreadyTerminal(AppointmentStatus),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for AppointmentError {
    fn from(e: DbError) -> Self {
        match e {
            // The partial unique index on (doctor, date, time) reports back
            // through PostgREST as a 409.
            DbError::Conflict(_) => AppointmentError::Conflict,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            AppointmentError::InvalidInput(msg) => AppError::ValidationError(msg),
            AppointmentError::Conflict => AppError::Conflict(
                "This time slot is already booked. Please choose another.".to_string(),
            ),
            AppointmentError::Forbidden => {
                AppError::Forbidden("Not allowed to modify this appointment".to_string())
            }
            AppointmentError::AlreadyTerminal(status) => {
                AppError::Conflict(format!("Appointment is already {}", status))
            }
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
