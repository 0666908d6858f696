// libs/treatment-cell/src/services/recording.rs
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus};
use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_models::auth::SessionUser;

use crate::models::{RecordTreatmentRequest, Treatment, TreatmentError};

pub struct TreatmentRecordingService {
    db: Arc<PostgrestClient>,
}

impl TreatmentRecordingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: Arc::new(PostgrestClient::new(config)),
        }
    }

    /// Upsert the treatment record for a completed appointment. Keyed on the
    /// unique appointment reference, so recording twice overwrites the same
    /// row and can never produce a duplicate.
    pub async fn record_treatment(
        &self,
        appointment_id: Uuid,
        doctor: &SessionUser,
        request: &RecordTreatmentRequest,
        auth_token: &str,
    ) -> Result<Treatment, TreatmentError> {
        debug!(
            "Recording treatment for appointment {} by doctor {}",
            appointment_id, doctor.id
        );

        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.doctor_id != doctor.id {
            return Err(TreatmentError::Forbidden);
        }

        // The transactional completion path writes the initial record; this
        // standalone entry point only ever touches already-completed rows.
        if appointment.status != AppointmentStatus::Completed {
            return Err(TreatmentError::NotCompleted);
        }

        let treatment_data = json!({
            "appointment_id": appointment_id,
            "doctor_id": doctor.id,
            "diagnosis": request.diagnosis,
            "prescription": request.prescription,
            "notes": request.notes,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let mut rows: Vec<Treatment> = self
            .db
            .request_with_headers(
                Method::POST,
                "/rest/v1/treatments?on_conflict=appointment_id",
                Some(auth_token),
                Some(treatment_data),
                Some(headers),
            )
            .await?;

        if rows.is_empty() {
            return Err(TreatmentError::DatabaseError(
                "Treatment upsert returned no row".to_string(),
            ));
        }

        let treatment = rows.remove(0);
        info!(
            "Treatment {} recorded for appointment {}",
            treatment.id, appointment_id
        );
        Ok(treatment)
    }

    /// The treatment for one appointment, visible to the involved patient,
    /// the involved doctor, or an admin.
    pub async fn treatment_for_appointment(
        &self,
        appointment_id: Uuid,
        actor: &SessionUser,
        auth_token: &str,
    ) -> Result<Treatment, TreatmentError> {
        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        let involved = appointment.patient_id == actor.id || appointment.doctor_id == actor.id;
        if !involved && actor.role != shared_models::person::Role::Admin {
            return Err(TreatmentError::Forbidden);
        }

        let path = format!("/rest/v1/treatments?appointment_id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(TreatmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| TreatmentError::DatabaseError(format!("Failed to parse treatment: {}", e)))
    }

    /// A patient's full treatment history, oldest first.
    pub async fn patient_history(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Treatment>, TreatmentError> {
        let appointment_ids = self
            .appointment_ids_for_patient(patient_id, auth_token)
            .await?;

        if appointment_ids.is_empty() {
            return Ok(vec![]);
        }

        let path = format!(
            "/rest/v1/treatments?appointment_id=in.({})&order=created_at.asc",
            join_ids(&appointment_ids)
        );
        self.fetch_treatments(&path, auth_token).await
    }

    /// Treatments a doctor has recorded for one patient. Gated on the doctor
    /// actually having an appointment with that patient.
    pub async fn doctor_patient_history(
        &self,
        doctor: &SessionUser,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Treatment>, TreatmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&patient_id=eq.{}",
            doctor.id, patient_id
        );
        let shared: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if shared.is_empty() {
            return Err(TreatmentError::Forbidden);
        }

        let appointment_ids = self
            .appointment_ids_for_patient(patient_id, auth_token)
            .await?;
        if appointment_ids.is_empty() {
            return Ok(vec![]);
        }

        let path = format!(
            "/rest/v1/treatments?doctor_id=eq.{}&appointment_id=in.({})&order=created_at.asc",
            doctor.id,
            join_ids(&appointment_ids)
        );
        self.fetch_treatments(&path, auth_token).await
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, TreatmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(TreatmentError::AppointmentNotFound);
        }

        serde_json::from_value(result[0].clone()).map_err(|e| {
            TreatmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
        })
    }

    async fn appointment_ids_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Uuid>, TreatmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&select=id",
            patient_id
        );
        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let ids = rows
            .iter()
            .filter_map(|row| row["id"].as_str())
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect();
        Ok(ids)
    }

    async fn fetch_treatments(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Treatment>, TreatmentError> {
        let result: Vec<Value> = self
            .db
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Treatment>, _>>()
            .map_err(|e| TreatmentError::DatabaseError(format!("Failed to parse treatments: {}", e)))
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
