// libs/auth-cell/src/models.rs
use serde::{Deserialize, Serialize};

use shared_database::DbError;
use shared_models::error::AppError;
use shared_models::person::PersonView;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub person: PersonView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    /// Unknown username, wrong password and deactivated account are
    /// deliberately indistinguishable to the caller.
    #[error("Invalid credentials or account is inactive")]
    InvalidCredentials,

    #[error("Person not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DbError> for AccountError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(_) => {
                AccountError::Conflict("Username or email already exists".to_string())
            }
            other => AccountError::DatabaseError(other.to_string()),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::InvalidInput(msg) => AppError::ValidationError(msg),
            AccountError::Conflict(msg) => AppError::Conflict(msg),
            AccountError::InvalidCredentials => {
                AppError::Auth("Invalid credentials or account is inactive".to_string())
            }
            AccountError::NotFound => AppError::NotFound("Person not found".to_string()),
            AccountError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
