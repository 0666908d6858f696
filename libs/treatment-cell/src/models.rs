// libs/treatment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;

/// A diagnosis/prescription record attached to a completed appointment.
/// Exactly one exists per completed appointment; recording again overwrites
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTreatmentRequest {
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TreatmentError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Treatment not found")]
    NotFound,

    #[error("Appointment is not completed")]
    NotCompleted,

    #[error("Not allowed to access this treatment record")]
    Forbidden,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for TreatmentError {
    fn from(e: DbError) -> Self {
        TreatmentError::DatabaseError(e.to_string())
    }
}

impl From<TreatmentError> for AppError {
    fn from(e: TreatmentError) -> Self {
        match e {
            TreatmentError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            TreatmentError::NotFound => AppError::NotFound("Treatment not found".to_string()),
            TreatmentError::NotCompleted => AppError::Conflict(
                "Treatment records can only be attached to completed appointments".to_string(),
            ),
            TreatmentError::Forbidden => {
                AppError::Forbidden("Not allowed to access this treatment record".to_string())
            }
            TreatmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
