// libs/doctor-cell/src/services/roster.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_models::person::Person;
use shared_utils::password::hash_password;

use crate::models::{CreateDoctorRequest, DoctorError, DoctorSummary, UpdateDoctorRequest};

/// First password for admin-created doctor accounts; doctors are expected to
/// change it at first login.
const DEFAULT_DOCTOR_PASSWORD: &str = "default123";

pub struct RosterService {
    db: Arc<PostgrestClient>,
}

impl RosterService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Arc::new(PostgrestClient::new(config)),
        }
    }

    /// Admin adds a doctor to the roster.
    pub async fn add_doctor(
        &self,
        request: &CreateDoctorRequest,
        auth_token: &str,
    ) -> Result<DoctorSummary, DoctorError> {
        debug!("Adding doctor {} to roster", request.username);

        if request.username.trim().is_empty()
            || request.email.trim().is_empty()
            || request.full_name.trim().is_empty()
        {
            return Err(DoctorError::InvalidInput(
                "username, email and full_name are required".to_string(),
            ));
        }

        if let Some(department_id) = request.department_id {
            self.verify_department_exists(department_id, auth_token)
                .await?;
        }

        let password_hash = hash_password(DEFAULT_DOCTOR_PASSWORD)
            .map_err(DoctorError::DatabaseError)?;

        let person_data = json!({
            "username": request.username,
            "email": request.email,
            "password_hash": password_hash,
            "full_name": request.full_name,
            "phone": request.phone,
            "role": "doctor",
            "department_id": request.department_id,
            "specialization": request.specialization,
            "is_active": true,
        });

        let mut rows: Vec<Person> = self
            .db
            .insert_returning("/rest/v1/persons", Some(auth_token), person_data)
            .await
            .map_err(|e| match e {
                shared_database::DbError::Conflict(_) => {
                    DoctorError::Conflict("Username or email already exists".to_string())
                }
                other => DoctorError::DatabaseError(other.to_string()),
            })?;

        if rows.is_empty() {
            return Err(DoctorError::DatabaseError(
                "Doctor insert returned no row".to_string(),
            ));
        }

        let person = rows.remove(0);
        info!("Doctor {} added with id {}", person.username, person.id);

        DoctorSummary::from_person(&person)
            .ok_or_else(|| DoctorError::DatabaseError("Stored person is not a doctor".to_string()))
    }

    /// Admin updates roster fields; only provided fields are written.
    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: &UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<DoctorSummary, DoctorError> {
        debug!("Updating doctor {}", doctor_id);

        if let Some(department_id) = request.department_id {
            self.verify_department_exists(department_id, auth_token)
                .await?;
        }

        let mut update = Map::new();
        if let Some(full_name) = &request.full_name {
            update.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(email) = &request.email {
            update.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = &request.phone {
            update.insert("phone".to_string(), json!(phone));
        }
        if let Some(department_id) = request.department_id {
            update.insert("department_id".to_string(), json!(department_id));
        }
        if let Some(specialization) = &request.specialization {
            update.insert("specialization".to_string(), json!(specialization));
        }

        if update.is_empty() {
            return Err(DoctorError::InvalidInput(
                "No fields to update".to_string(),
            ));
        }

        let path = format!("/rest/v1/persons?id=eq.{}&role=eq.doctor", doctor_id);
        let mut rows: Vec<Person> = self
            .db
            .update_returning(&path, Some(auth_token), Value::Object(update))
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }

        let person = rows.remove(0);
        DoctorSummary::from_person(&person)
            .ok_or_else(|| DoctorError::DatabaseError("Stored person is not a doctor".to_string()))
    }

    /// Soft removal: flips is_active. Appointment and treatment history stay
    /// untouched.
    pub async fn deactivate_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<(), DoctorError> {
        debug!("Deactivating doctor {}", doctor_id);

        let path = format!("/rest/v1/persons?id=eq.{}&role=eq.doctor", doctor_id);
        let rows: Vec<Value> = self
            .db
            .update_returning(&path, Some(auth_token), json!({ "is_active": false }))
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }

        info!("Doctor {} deactivated", doctor_id);
        Ok(())
    }

    /// Active doctors, optionally scoped to a department, ordered by name.
    pub async fn active_doctors(
        &self,
        department_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<DoctorSummary>, DoctorError> {
        let mut query_parts = vec![
            "role=eq.doctor".to_string(),
            "is_active=eq.true".to_string(),
        ];
        if let Some(department_id) = department_id {
            query_parts.push(format!("department_id=eq.{}", department_id));
        }

        let path = format!(
            "/rest/v1/persons?{}&order=full_name.asc",
            query_parts.join("&")
        );
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let persons: Vec<Person> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Person>, _>>()
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse persons: {}", e)))?;

        Ok(persons
            .iter()
            .filter_map(DoctorSummary::from_person)
            .collect())
    }

    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<DoctorSummary, DoctorError> {
        let path = format!("/rest/v1/persons?id=eq.{}&role=eq.doctor", doctor_id);
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::NotFound);
        }

        let person: Person = serde_json::from_value(rows[0].clone())
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse person: {}", e)))?;

        DoctorSummary::from_person(&person).ok_or(DoctorError::NotFound)
    }

    async fn verify_department_exists(
        &self,
        department_id: Uuid,
        auth_token: &str,
    ) -> Result<(), DoctorError> {
        let path = format!("/rest/v1/departments?id=eq.{}&select=id", department_id);
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::DepartmentNotFound);
        }
        Ok(())
    }
}
