use std::fmt;

use shared_models::auth::SessionUser;
use shared_models::error::AppError;
use shared_models::person::Role;

/// Capability required by a service operation. Each route declares exactly
/// one of these; there is no role hierarchy, so an admin does not pass a
/// doctor-only or patient-only gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    Admin,
    Doctor,
    Patient,
    AnyAuthenticated,
}

impl fmt::Display for RequiredRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredRole::Admin => write!(f, "admin"),
            RequiredRole::Doctor => write!(f, "doctor"),
            RequiredRole::Patient => write!(f, "patient"),
            RequiredRole::AnyAuthenticated => write!(f, "any authenticated user"),
        }
    }
}

/// Why an operation was denied. The two cases map to different user-visible
/// responses: NotAuthenticated is a 401 (log in first), WrongRole a 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denied {
    NotAuthenticated,
    WrongRole { required: RequiredRole, actual: Role },
}

impl From<Denied> for AppError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::NotAuthenticated => AppError::Auth("Please log in first".to_string()),
            Denied::WrongRole { required, .. } => {
                AppError::Forbidden(format!("This operation requires {} access", required))
            }
        }
    }
}

/// The authorization gate. Invoked at the top of every service operation
/// with the identity resolved by the auth middleware.
pub fn authorize<'a>(
    session: Option<&'a SessionUser>,
    required: RequiredRole,
) -> Result<&'a SessionUser, Denied> {
    let user = session.ok_or(Denied::NotAuthenticated)?;

    let allowed = match required {
        RequiredRole::Admin => user.role == Role::Admin,
        RequiredRole::Doctor => user.role == Role::Doctor,
        RequiredRole::Patient => user.role == Role::Patient,
        RequiredRole::AnyAuthenticated => true,
    };

    if allowed {
        Ok(user)
    } else {
        Err(Denied::WrongRole {
            required,
            actual: user.role,
        })
    }
}
