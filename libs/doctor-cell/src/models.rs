// libs/doctor-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DbError;
use shared_models::error::AppError;
use shared_models::person::{Person, RoleProfile};

// ==============================================================================
// DEPARTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub description: Option<String>,
}

// ==============================================================================
// DOCTOR ROSTER MODELS
// ==============================================================================

/// Public roster projection of a doctor. Built from a Person row; no
/// credentials pass through here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department_id: Option<Uuid>,
    pub specialization: Option<String>,
}

impl DoctorSummary {
    /// None when the person is not a doctor.
    pub fn from_person(person: &Person) -> Option<Self> {
        match &person.profile {
            RoleProfile::Doctor {
                department_id,
                specialization,
            } => Some(Self {
                id: person.id,
                username: person.username.clone(),
                full_name: person.full_name.clone(),
                email: person.email.clone(),
                phone: person.phone.clone(),
                department_id: *department_id,
                specialization: specialization.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub department_id: Option<Uuid>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<Uuid>,
    pub specialization: Option<String>,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// An advertised slot. Informational only - booking is constrained by the
/// double-booking check, not by these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub available_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub available_date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Department not found")]
    DepartmentNotFound,

    #[error("Availability slot not found")]
    AvailabilityNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for DoctorError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(_) => {
                DoctorError::Conflict("A record with these unique fields already exists".to_string())
            }
            other => DoctorError::DatabaseError(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::DepartmentNotFound => {
                AppError::NotFound("Department not found".to_string())
            }
            DoctorError::AvailabilityNotFound => {
                AppError::NotFound("Availability slot not found".to_string())
            }
            DoctorError::Conflict(msg) => AppError::Conflict(msg),
            DoctorError::InvalidInput(msg) => AppError::ValidationError(msg),
            DoctorError::Forbidden(msg) => AppError::Forbidden(msg),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
