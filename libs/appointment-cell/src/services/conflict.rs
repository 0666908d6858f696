// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::PostgrestClient;

use crate::models::{Appointment, AppointmentError};

/// Application-level double-booking check. This is only the fast path that
/// gives the caller a friendly Conflict before any row is written; under
/// concurrent requests the partial unique index on
/// appointments(doctor_id, appointment_date, appointment_time) is the
/// authority.
pub struct ConflictCheckService {
    db: Arc<PostgrestClient>,
}

impl ConflictCheckService {
    pub fn new(db: Arc<PostgrestClient>) -> Self {
        Self { db }
    }

    /// All non-Cancelled appointments for a doctor at an exact slot.
    pub async fn active_appointments_at(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!(
            "Checking conflicts for doctor {} at {} {}",
            doctor_id, date, time
        );

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&appointment_time=eq.{}&status=neq.Cancelled",
            doctor_id,
            date.format("%Y-%m-%d"),
            time.format("%H:%M:%S"),
        );

        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let appointments: Vec<Appointment> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| {
                AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e))
            })?;

        Ok(appointments)
    }

    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let conflicting = self
            .active_appointments_at(doctor_id, date, time, auth_token)
            .await?;

        if !conflicting.is_empty() {
            warn!(
                "Conflict detected for doctor {} at {} {} - {} existing appointment(s)",
                doctor_id,
                date,
                time,
                conflicting.len()
            );
        }

        Ok(!conflicting.is_empty())
    }
}
