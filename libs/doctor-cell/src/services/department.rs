// libs/doctor-cell/src/services/department.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{DbError, PostgrestClient};

use crate::models::{CreateDepartmentRequest, Department, DoctorError};

pub struct DepartmentService {
    db: Arc<PostgrestClient>,
}

impl DepartmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Arc::new(PostgrestClient::new(config)),
        }
    }

    /// Admin creates a department. Names are unique.
    pub async fn create_department(
        &self,
        request: &CreateDepartmentRequest,
        auth_token: &str,
    ) -> Result<Department, DoctorError> {
        debug!("Creating department {}", request.name);

        if request.name.trim().is_empty() {
            return Err(DoctorError::InvalidInput(
                "Department name is required".to_string(),
            ));
        }

        let department_data = json!({
            "name": request.name,
            "description": request.description,
        });

        let mut rows: Vec<Department> = self
            .db
            .insert_returning("/rest/v1/departments", Some(auth_token), department_data)
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => {
                    DoctorError::Conflict("Department name already exists".to_string())
                }
                other => DoctorError::DatabaseError(other.to_string()),
            })?;

        if rows.is_empty() {
            return Err(DoctorError::DatabaseError(
                "Department insert returned no row".to_string(),
            ));
        }

        let department = rows.remove(0);
        info!("Department {} created", department.name);
        Ok(department)
    }

    pub async fn list_departments(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Department>, DoctorError> {
        let rows: Vec<Value> = self
            .db
            .request(
                Method::GET,
                "/rest/v1/departments?order=name.asc",
                Some(auth_token),
                None,
            )
            .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Department>, _>>()
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse departments: {}", e)))
    }
}
