// libs/doctor-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_models::auth::SessionUser;

use crate::models::{Availability, CreateAvailabilityRequest, DoctorError};

pub struct AvailabilityService {
    db: Arc<PostgrestClient>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Arc::new(PostgrestClient::new(config)),
        }
    }

    /// Doctor advertises a slot on a given date. The slot is informational;
    /// it does not constrain booking.
    pub async fn create_slot(
        &self,
        doctor: &SessionUser,
        request: &CreateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<Availability, DoctorError> {
        debug!("Creating availability slot for doctor {}", doctor.id);

        let date = NaiveDate::parse_from_str(&request.available_date, "%Y-%m-%d")
            .map_err(|_| {
                DoctorError::InvalidInput(format!(
                    "Invalid date '{}'; expected YYYY-MM-DD",
                    request.available_date
                ))
            })?;
        let start_time = parse_time(&request.start_time)?;
        let end_time = parse_time(&request.end_time)?;

        if start_time >= end_time {
            return Err(DoctorError::InvalidInput(
                "Start time must be before end time".to_string(),
            ));
        }

        let availability_data = json!({
            "doctor_id": doctor.id,
            "available_date": date.format("%Y-%m-%d").to_string(),
            "start_time": start_time.format("%H:%M:%S").to_string(),
            "end_time": end_time.format("%H:%M:%S").to_string(),
            "is_available": true,
        });

        let mut rows: Vec<Availability> = self
            .db
            .insert_returning("/rest/v1/availabilities", Some(auth_token), availability_data)
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::DatabaseError(
                "Availability insert returned no row".to_string(),
            ));
        }

        let slot = rows.remove(0);
        info!("Availability slot {} created for doctor {}", slot.id, doctor.id);
        Ok(slot)
    }

    pub async fn slots_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Availability>, DoctorError> {
        let path = format!(
            "/rest/v1/availabilities?doctor_id=eq.{}&order=available_date.asc,start_time.asc",
            doctor_id
        );
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Availability>, _>>()
            .map_err(|e| {
                DoctorError::DatabaseError(format!("Failed to parse availabilities: {}", e))
            })
    }

    /// Doctors may flip their own slots on and off without deleting them.
    pub async fn set_slot_availability(
        &self,
        slot_id: Uuid,
        doctor: &SessionUser,
        is_available: bool,
        auth_token: &str,
    ) -> Result<Availability, DoctorError> {
        // Scoping the update to the doctor's own rows makes a foreign slot
        // indistinguishable from a missing one.
        let path = format!(
            "/rest/v1/availabilities?id=eq.{}&doctor_id=eq.{}",
            slot_id, doctor.id
        );
        let mut rows: Vec<Availability> = self
            .db
            .update_returning(&path, Some(auth_token), json!({ "is_available": is_available }))
            .await?;

        if rows.is_empty() {
            return Err(DoctorError::AvailabilityNotFound);
        }

        Ok(rows.remove(0))
    }
}

fn parse_time(input: &str) -> Result<NaiveTime, DoctorError> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| DoctorError::InvalidInput(format!("Invalid time '{}'; expected HH:MM", input)))
}
