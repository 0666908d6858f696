// libs/admin-cell/src/services/reporting.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_models::person::{Person, PersonView};

use crate::models::{AdminError, DashboardStats, SearchKind};

pub struct ReportingService {
    db: Arc<PostgrestClient>,
}

impl ReportingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Arc::new(PostgrestClient::new(config)),
        }
    }

    /// Headline counts for the admin dashboard.
    pub async fn dashboard_stats(&self, auth_token: &str) -> Result<DashboardStats, AdminError> {
        debug!("Collecting dashboard statistics");

        let total_doctors = self
            .count_rows(
                "/rest/v1/persons?role=eq.doctor&is_active=eq.true&select=id",
                auth_token,
            )
            .await?;
        let total_patients = self
            .count_rows(
                "/rest/v1/persons?role=eq.patient&is_active=eq.true&select=id",
                auth_token,
            )
            .await?;
        let total_appointments = self
            .count_rows("/rest/v1/appointments?select=id", auth_token)
            .await?;

        let today = Utc::now().date_naive().format("%Y-%m-%d");
        let upcoming_appointments = self
            .count_rows(
                &format!(
                    "/rest/v1/appointments?appointment_date=gte.{}&status=neq.Cancelled&select=id",
                    today
                ),
                auth_token,
            )
            .await?;

        Ok(DashboardStats {
            total_doctors,
            total_patients,
            total_appointments,
            upcoming_appointments,
        })
    }

    /// Contains-match over the roster. Doctors match on name or
    /// specialization, patients on name or email; inactive people never
    /// surface.
    pub async fn search_people(
        &self,
        kind: SearchKind,
        query: &str,
        auth_token: &str,
    ) -> Result<Vec<PersonView>, AdminError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdminError::InvalidInput(
                "Search query must not be empty".to_string(),
            ));
        }

        let pattern = urlencoding::encode(query).into_owned();
        let path = match kind {
            SearchKind::Doctor => format!(
                "/rest/v1/persons?role=eq.doctor&is_active=eq.true&or=(full_name.ilike.*{}*,specialization.ilike.*{}*)&order=full_name.asc",
                pattern, pattern
            ),
            SearchKind::Patient => format!(
                "/rest/v1/persons?role=eq.patient&is_active=eq.true&or=(full_name.ilike.*{}*,email.ilike.*{}*)&order=full_name.asc",
                pattern, pattern
            ),
        };

        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let persons: Vec<Person> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Person>, _>>()
            .map_err(|e| AdminError::DatabaseError(format!("Failed to parse persons: {}", e)))?;

        Ok(persons.iter().map(Person::to_view).collect())
    }

    async fn count_rows(&self, path: &str, auth_token: &str) -> Result<usize, AdminError> {
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, path, Some(auth_token), None)
            .await?;
        Ok(rows.len())
    }
}
