use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::SessionUser;
use shared_models::person::Role;

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a wiremock PostgREST double.
    pub fn with_mock_server(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            role,
        }
    }

    pub fn doctor(username: &str) -> Self {
        Self::new(username, Role::Doctor)
    }

    pub fn patient(username: &str) -> Self {
        Self::new(username, Role::Patient)
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn to_session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn to_token(&self, secret: &str) -> String {
        issue_token(self.id, &self.username, self.role, secret, 24)
            .expect("test token should sign")
    }
}

/// JSON row builders shaped like the PostgREST responses the services parse.
pub struct MockRows;

impl MockRows {
    pub fn patient(id: Uuid, username: &str, password_hash: &str) -> Value {
        json!({
            "id": id.to_string(),
            "username": username,
            "email": format!("{}@example.test", username),
            "password_hash": password_hash,
            "full_name": format!("Test {}", username),
            "phone": "555-0100",
            "role": "patient",
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "department_id": null,
            "specialization": null
        })
    }

    pub fn doctor(id: Uuid, username: &str, specialization: &str) -> Value {
        json!({
            "id": id.to_string(),
            "username": username,
            "email": format!("{}@hospital.test", username),
            "password_hash": "$argon2id$unused",
            "full_name": format!("Dr. {}", username),
            "phone": null,
            "role": "doctor",
            "is_active": true,
            "created_at": Utc::now().to_rfc3339(),
            "department_id": null,
            "specialization": specialization
        })
    }

    pub fn inactive_doctor(id: Uuid, username: &str) -> Value {
        let mut row = Self::doctor(id, username, "General Medicine");
        row["is_active"] = json!(false);
        row
    }

    pub fn appointment(
        id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: &str,
        time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": id.to_string(),
            "patient_id": patient_id.to_string(),
            "doctor_id": doctor_id.to_string(),
            "appointment_date": date,
            "appointment_time": time,
            "status": status,
            "reason": "checkup",
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn treatment(id: Uuid, appointment_id: Uuid, doctor_id: Uuid, diagnosis: &str) -> Value {
        json!({
            "id": id.to_string(),
            "appointment_id": appointment_id.to_string(),
            "doctor_id": doctor_id.to_string(),
            "diagnosis": diagnosis,
            "prescription": "rest and fluids",
            "notes": null,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn department(id: Uuid, name: &str) -> Value {
        json!({
            "id": id.to_string(),
            "name": name,
            "description": format!("{} department", name),
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn availability(id: Uuid, doctor_id: Uuid, date: &str, start: &str, end: &str) -> Value {
        json!({
            "id": id.to_string(),
            "doctor_id": doctor_id.to_string(),
            "available_date": date,
            "start_time": start,
            "end_time": end,
            "is_available": true,
            "created_at": Utc::now().to_rfc3339()
        })
    }
}
