use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

/// Role-specific part of a person record. Internally tagged on the `role`
/// column, so department/specialization only exist on the Doctor variant and
/// a patient carrying a specialization cannot be represented at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Admin,
    Doctor {
        department_id: Option<Uuid>,
        specialization: Option<String>,
    },
    Patient,
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Admin => Role::Admin,
            RoleProfile::Doctor { .. } => Role::Doctor,
            RoleProfile::Patient => Role::Patient,
        }
    }
}

/// A row in the `persons` table. Admins, doctors and patients share the
/// table; the flattened `profile` carries the role tag and any role-specific
/// columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl Person {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn is_active_doctor(&self) -> bool {
        self.is_active && self.role() == Role::Doctor
    }

    /// Public projection of a person. Never carries the password hash.
    pub fn to_view(&self) -> PersonView {
        PersonView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            profile: self.profile.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: RoleProfile,
}
