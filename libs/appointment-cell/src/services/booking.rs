// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_models::auth::SessionUser;
use shared_models::person::{Person, Role};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, SetStatusRequest,
};
use crate::services::conflict::ConflictCheckService;
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct AppointmentBookingService {
    db: Arc<PostgrestClient>,
    conflict_service: ConflictCheckService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let db = Arc::new(PostgrestClient::new(config));
        let conflict_service = ConflictCheckService::new(Arc::clone(&db));
        let lifecycle_service = AppointmentLifecycleService::new();

        Self {
            db,
            conflict_service,
            lifecycle_service,
        }
    }

    /// Book an appointment for a patient with a doctor at an exact slot.
    ///
    /// The existence check here is only the user-friendly fast path; the
    /// insert still races against concurrent bookings, and the partial
    /// unique index resolves that race (surfaced as a 409 and mapped back
    /// to Conflict).
    pub async fn book_appointment(
        &self,
        patient_id: Uuid,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            patient_id, request.doctor_id
        );

        let date = parse_date(&request.appointment_date)?;
        let time = parse_time(&request.appointment_time)?;

        self.verify_active_doctor(request.doctor_id, auth_token).await?;

        if self
            .conflict_service
            .has_conflict(request.doctor_id, date, time, auth_token)
            .await?
        {
            return Err(AppointmentError::Conflict);
        }

        let appointment_data = json!({
            "patient_id": patient_id,
            "doctor_id": request.doctor_id,
            "appointment_date": date.format("%Y-%m-%d").to_string(),
            "appointment_time": time.format("%H:%M:%S").to_string(),
            "status": AppointmentStatus::Booked,
            "reason": request.reason,
        });

        let mut rows: Vec<Appointment> = self
            .db
            .insert_returning("/rest/v1/appointments", Some(auth_token), appointment_data)
            .await?;

        if rows.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Appointment insert returned no row".to_string(),
            ));
        }

        let appointment = rows.remove(0);
        info!("Appointment {} booked successfully", appointment.id);
        Ok(appointment)
    }

    /// Cancel an appointment. Only the owning patient or an admin may
    /// cancel, and only while the appointment is still Booked.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        actor: &SessionUser,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment {} as {}", appointment_id, actor.role);

        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        match actor.role {
            Role::Admin => {}
            Role::Patient if appointment.patient_id == actor.id => {}
            _ => return Err(AppointmentError::Forbidden),
        }

        if appointment.status.is_terminal() {
            return Err(AppointmentError::AlreadyTerminal(appointment.status));
        }

        // Conditional update: the status filter makes the first committer
        // win. A concurrent completion leaves zero matching rows and we
        // re-read to report the terminal state we lost to.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id,
            AppointmentStatus::Booked
        );
        let mut rows: Vec<Appointment> = self
            .db
            .update_returning(
                &path,
                Some(auth_token),
                json!({ "status": AppointmentStatus::Cancelled }),
            )
            .await?;

        if rows.is_empty() {
            let current = self.get_appointment(appointment_id, auth_token).await?;
            warn!(
                "Lost cancellation race for appointment {}; now {}",
                appointment_id, current.status
            );
            return Err(AppointmentError::AlreadyTerminal(current.status));
        }

        let cancelled = rows.remove(0);
        info!("Appointment {} cancelled", cancelled.id);
        Ok(cancelled)
    }

    /// Status update by the assigned doctor. The only doctor transition is
    /// Booked -> Completed, which also upserts the treatment record inside
    /// a single database transaction (complete_appointment function); if
    /// the treatment write fails the status change is not committed.
    pub async fn set_status(
        &self,
        appointment_id: Uuid,
        doctor: &SessionUser,
        request: &SetStatusRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Doctor {} setting appointment {} to {}",
            doctor.id, appointment_id, request.status
        );

        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.doctor_id != doctor.id {
            return Err(AppointmentError::Forbidden);
        }

        self.lifecycle_service
            .validate_status_transition(appointment.status, request.status)?;

        match request.status {
            AppointmentStatus::Completed => {
                self.complete_appointment(appointment_id, doctor.id, request, auth_token)
                    .await
            }
            // Cancellation belongs to the owning patient or an admin.
            _ => Err(AppointmentError::Forbidden),
        }
    }

    async fn complete_appointment(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
        request: &SetStatusRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let args = json!({
            "p_appointment_id": appointment_id,
            "p_doctor_id": doctor_id,
            "p_diagnosis": request.diagnosis,
            "p_prescription": request.prescription,
            "p_notes": request.notes,
        });

        let mut rows: Vec<Appointment> = self
            .db
            .rpc("complete_appointment", Some(auth_token), args)
            .await?;

        if rows.is_empty() {
            // The function updates nothing unless the row was still Booked
            // and assigned to this doctor - a concurrent writer got there
            // first.
            let current = self.get_appointment(appointment_id, auth_token).await?;
            warn!(
                "Lost completion race for appointment {}; now {}",
                appointment_id, current.status
            );
            return Err(AppointmentError::AlreadyTerminal(current.status));
        }

        let completed = rows.remove(0);
        info!(
            "Appointment {} completed with treatment recorded",
            completed.id
        );
        Ok(completed)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone()).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
        })
    }

    pub async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.asc,appointment_time.asc",
            patient_id
        );
        self.fetch_appointments(&path, auth_token).await
    }

    pub async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.asc,appointment_time.asc",
            doctor_id
        );
        self.fetch_appointments(&path, auth_token).await
    }

    /// Upcoming = date on or after `as_of` and not Cancelled, optionally
    /// scoped to one patient or one doctor.
    pub async fn upcoming_appointments(
        &self,
        as_of: NaiveDate,
        patient_id: Option<Uuid>,
        doctor_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = vec![
            format!("appointment_date=gte.{}", as_of.format("%Y-%m-%d")),
            "status=neq.Cancelled".to_string(),
        ];

        if let Some(patient_id) = patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(doctor_id) = doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor_id));
        }

        let path = format!(
            "/rest/v1/appointments?{}&order=appointment_date.asc,appointment_time.asc",
            query_parts.join("&")
        );
        self.fetch_appointments(&path, auth_token).await
    }

    pub async fn all_appointments(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch_appointments(
            "/rest/v1/appointments?order=appointment_date.asc,appointment_time.asc",
            auth_token,
        )
        .await
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn fetch_appointments(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self
            .db
            .request(Method::GET, path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| {
                AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e))
            })
    }

    async fn verify_active_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Person, AppointmentError> {
        let path = format!("/rest/v1/persons?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        if result.is_empty() {
            return Err(AppointmentError::DoctorNotFound);
        }

        let person: Person = serde_json::from_value(result[0].clone()).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse person: {}", e))
        })?;

        if !person.is_active_doctor() {
            return Err(AppointmentError::InvalidInput(
                "Referenced person is not an active doctor".to_string(),
            ));
        }

        Ok(person)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        AppointmentError::InvalidInput(format!(
            "Invalid appointment date '{}'; expected YYYY-MM-DD",
            input
        ))
    })
}

fn parse_time(input: &str) -> Result<NaiveTime, AppointmentError> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| {
            AppointmentError::InvalidInput(format!(
                "Invalid appointment time '{}'; expected HH:MM",
                input
            ))
        })
}
