// libs/auth-cell/src/services/account.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_models::person::{Person, PersonView};
use shared_utils::jwt::issue_token;
use shared_utils::password::{hash_password, verify_password};

use crate::models::{
    AccountError, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest,
};

const TOKEN_TTL_HOURS: i64 = 24;

pub struct AccountService {
    db: Arc<PostgrestClient>,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Arc::new(PostgrestClient::new(config)),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Self-service registration always creates a patient. Doctors and
    /// admins only come from the admin roster or seeding.
    pub async fn register(&self, request: &RegisterRequest) -> Result<PersonView, AccountError> {
        debug!("Registering patient {}", request.username);

        if request.username.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
            || request.full_name.trim().is_empty()
        {
            return Err(AccountError::InvalidInput(
                "All fields are required".to_string(),
            ));
        }

        if request.password != request.confirm_password {
            return Err(AccountError::InvalidInput(
                "Passwords do not match".to_string(),
            ));
        }

        let password_hash =
            hash_password(&request.password).map_err(AccountError::DatabaseError)?;

        let person_data = json!({
            "username": request.username,
            "email": request.email,
            "password_hash": password_hash,
            "full_name": request.full_name,
            "phone": request.phone,
            "role": "patient",
            "is_active": true,
        });

        let mut rows: Vec<Person> = self
            .db
            .insert_returning("/rest/v1/persons", None, person_data)
            .await?;

        if rows.is_empty() {
            return Err(AccountError::DatabaseError(
                "Registration insert returned no row".to_string(),
            ));
        }

        let person = rows.remove(0);
        info!("Patient {} registered with id {}", person.username, person.id);
        Ok(person.to_view())
    }

    /// Verify credentials and mint a session token. Unknown username, bad
    /// password and deactivated account all fail identically.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AccountError> {
        debug!("Login attempt for {}", request.username);

        let path = format!(
            "/rest/v1/persons?username=eq.{}",
            urlencoding::encode(&request.username)
        );
        let rows: Vec<Value> = self.db.request(Method::GET, &path, None, None).await?;

        let person: Person = match rows.first() {
            Some(row) => serde_json::from_value(row.clone()).map_err(|e| {
                AccountError::DatabaseError(format!("Failed to parse person: {}", e))
            })?,
            None => return Err(AccountError::InvalidCredentials),
        };

        if !verify_password(&person.password_hash, &request.password) || !person.is_active {
            return Err(AccountError::InvalidCredentials);
        }

        let token = issue_token(
            person.id,
            &person.username,
            person.role(),
            &self.jwt_secret,
            TOKEN_TTL_HOURS,
        )
        .map_err(AccountError::DatabaseError)?;

        info!("Login successful for {} ({})", person.username, person.role());
        Ok(LoginResponse {
            token,
            person: person.to_view(),
        })
    }

    pub async fn get_profile(
        &self,
        person_id: Uuid,
        auth_token: &str,
    ) -> Result<PersonView, AccountError> {
        let person = self.get_person(person_id, auth_token).await?;
        Ok(person.to_view())
    }

    /// Update the caller's own contact fields.
    pub async fn update_profile(
        &self,
        person_id: Uuid,
        request: &UpdateProfileRequest,
        auth_token: &str,
    ) -> Result<PersonView, AccountError> {
        debug!("Updating profile for {}", person_id);

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

        if update.is_empty() {
            return Err(AccountError::InvalidInput("No fields to update".to_string()));
        }

        let path = format!("/rest/v1/persons?id=eq.{}", person_id);
        let mut rows: Vec<Person> = self
            .db
            .update_returning(&path, Some(auth_token), Value::Object(update))
            .await?;

        if rows.is_empty() {
            return Err(AccountError::NotFound);
        }

        Ok(rows.remove(0).to_view())
    }

    async fn get_person(
        &self,
        person_id: Uuid,
        auth_token: &str,
    ) -> Result<Person, AccountError> {
        let path = format!("/rest/v1/persons?id=eq.{}", person_id);
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if rows.is_empty() {
            return Err(AccountError::NotFound);
        }

        serde_json::from_value(rows[0].clone())
            .map_err(|e| AccountError::DatabaseError(format!("Failed to parse person: {}", e)))
    }
}
