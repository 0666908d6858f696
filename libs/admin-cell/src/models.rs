// libs/admin-cell/src/models.rs
use serde::{Deserialize, Serialize};

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_doctors: usize,
    pub total_patients: usize,
    pub total_appointments: usize,
    pub upcoming_appointments: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Doctor,
    Patient,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub kind: SearchKind,
    pub q: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AdminError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for AdminError {
    fn from(e: DbError) -> Self {
        AdminError::DatabaseError(e.to_string())
    }
}

impl From<AdminError> for AppError {
    fn from(e: AdminError) -> Self {
        match e {
            AdminError::InvalidInput(msg) => AppError::ValidationError(msg),
            AdminError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
