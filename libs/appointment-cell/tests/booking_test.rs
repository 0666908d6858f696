use assert_matches::assert_matches;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, BookAppointmentRequest, SetStatusRequest,
};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_utils::test_utils::{MockRows, TestConfig, TestUser};

const TOKEN: &str = "test-token";

fn booking_request(doctor_id: Uuid, date: &str, time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient_id: None,
        doctor_id,
        appointment_date: date.to_string(),
        appointment_time: time.to_string(),
        reason: Some("checkup".to_string()),
    }
}

async fn service_against(mock_server: &MockServer) -> AppointmentBookingService {
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    AppointmentBookingService::new(&config)
}

async fn mount_doctor(mock_server: &MockServer, doctor_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/persons"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            MockRows::doctor(doctor_id, "drsmith", "Cardiology")
        ])))
        .mount(mock_server)
        .await;
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test]
async fn booking_a_free_slot_succeeds() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient = TestUser::patient("pat");

    mount_doctor(&mock_server, doctor_id).await;

    // No existing appointment at the slot
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.Cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let created = MockRows::appointment(
        Uuid::new_v4(),
        patient.id,
        doctor_id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([created])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let appointment = service
        .book_appointment(
            patient.id,
            &booking_request(doctor_id, "2025-06-01", "10:00"),
            TOKEN,
        )
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Booked);
    assert_eq!(appointment.doctor_id, doctor_id);
    assert_eq!(appointment.patient_id, patient.id);
}

#[tokio::test]
async fn booking_a_taken_slot_is_rejected_without_insert() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient = TestUser::patient("second");

    mount_doctor(&mock_server, doctor_id).await;

    // Another patient already holds the slot
    let existing = MockRows::appointment(
        Uuid::new_v4(),
        Uuid::new_v4(),
        doctor_id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.Cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([existing])))
        .mount(&mock_server)
        .await;

    // The conflict must be reported before any row is written
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .book_appointment(
            patient.id,
            &booking_request(doctor_id, "2025-06-01", "10:00"),
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::Conflict));
}

#[tokio::test]
async fn lost_insert_race_surfaces_as_conflict() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient = TestUser::patient("racer");

    mount_doctor(&mock_server, doctor_id).await;

    // Pre-check sees a free slot...
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.Cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    // ...but the partial unique index rejects the insert.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_doctor_slot_active\""
        })))
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .book_appointment(
            patient.id,
            &booking_request(doctor_id, "2025-06-01", "10:00"),
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::Conflict));
}

#[tokio::test]
async fn malformed_date_or_time_is_invalid_input() {
    let mock_server = MockServer::start().await;
    let service = service_against(&mock_server).await;
    let patient = TestUser::patient("pat");

    let result = service
        .book_appointment(
            patient.id,
            &booking_request(Uuid::new_v4(), "01-06-2025", "10:00"),
            TOKEN,
        )
        .await;
    assert_matches!(result, Err(AppointmentError::InvalidInput(_)));

    let result = service
        .book_appointment(
            patient.id,
            &booking_request(Uuid::new_v4(), "2025-06-01", "ten o'clock"),
            TOKEN,
        )
        .await;
    assert_matches!(result, Err(AppointmentError::InvalidInput(_)));
}

#[tokio::test]
async fn booking_with_inactive_doctor_is_rejected() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient = TestUser::patient("pat");

    Mock::given(method("GET"))
        .and(path("/rest/v1/persons"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            MockRows::inactive_doctor(doctor_id, "retired")
        ])))
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .book_appointment(
            patient.id,
            &booking_request(doctor_id, "2025-06-01", "10:00"),
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidInput(_)));
}

#[tokio::test]
async fn booking_with_unknown_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/persons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .book_appointment(
            Uuid::new_v4(),
            &booking_request(doctor_id, "2025-06-01", "10:00"),
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::DoctorNotFound));
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

#[tokio::test]
async fn owning_patient_can_cancel_booked_appointment() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("owner");
    let appointment_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    let booked = MockRows::appointment(
        appointment_id,
        patient.id,
        doctor_id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked])))
        .mount(&mock_server)
        .await;

    let mut cancelled = MockRows::appointment(
        appointment_id,
        patient.id,
        doctor_id,
        "2025-06-01",
        "10:00:00",
        "Cancelled",
    );
    cancelled["reason"] = serde_json::json!("checkup");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(query_param("status", "eq.Booked"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([cancelled])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .cancel_appointment(appointment_id, &patient.to_session_user(), TOKEN)
        .await
        .unwrap();

    assert_eq!(result.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn cancelling_another_patients_appointment_is_forbidden() {
    let mock_server = MockServer::start().await;
    let owner_id = Uuid::new_v4();
    let intruder = TestUser::patient("intruder");
    let appointment_id = Uuid::new_v4();

    let booked = MockRows::appointment(
        appointment_id,
        owner_id,
        Uuid::new_v4(),
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked])))
        .mount(&mock_server)
        .await;

    // The appointment must stay untouched
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .cancel_appointment(appointment_id, &intruder.to_session_user(), TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::Forbidden));
}

#[tokio::test]
async fn doctors_cannot_cancel_appointments() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("drsmith");
    let appointment_id = Uuid::new_v4();

    let booked = MockRows::appointment(
        appointment_id,
        Uuid::new_v4(),
        doctor.id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked])))
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .cancel_appointment(appointment_id, &doctor.to_session_user(), TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::Forbidden));
}

#[tokio::test]
async fn cancelling_a_cancelled_appointment_reports_already_terminal() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("owner");
    let appointment_id = Uuid::new_v4();

    let row = MockRows::appointment(
        appointment_id,
        patient.id,
        Uuid::new_v4(),
        "2025-06-01",
        "10:00:00",
        "Cancelled",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([row])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .cancel_appointment(appointment_id, &patient.to_session_user(), TOKEN)
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::AlreadyTerminal(AppointmentStatus::Cancelled))
    );
}

#[tokio::test]
async fn losing_the_cancel_race_reports_the_winning_terminal_state() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("owner");
    let appointment_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    // First read still sees Booked; after the conditional update matches
    // nothing, the re-read sees the completion that won.
    let booked = MockRows::appointment(
        appointment_id,
        patient.id,
        doctor_id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    let completed = MockRows::appointment(
        appointment_id,
        patient.id,
        doctor_id,
        "2025-06-01",
        "10:00:00",
        "Completed",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([completed])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.Booked"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let result = service
        .cancel_appointment(appointment_id, &patient.to_session_user(), TOKEN)
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::AlreadyTerminal(AppointmentStatus::Completed))
    );
}

// ==============================================================================
// STATUS UPDATES
// ==============================================================================

#[tokio::test]
async fn assigned_doctor_completes_appointment_through_rpc() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("drsmith");
    let appointment_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    let booked = MockRows::appointment(
        appointment_id,
        patient_id,
        doctor.id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked])))
        .mount(&mock_server)
        .await;

    let completed = MockRows::appointment(
        appointment_id,
        patient_id,
        doctor.id,
        "2025-06-01",
        "10:00:00",
        "Completed",
    );
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/complete_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([completed])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = SetStatusRequest {
        status: AppointmentStatus::Completed,
        diagnosis: Some("flu".to_string()),
        prescription: Some("rest and fluids".to_string()),
        notes: None,
    };

    let service = service_against(&mock_server).await;
    let result = service
        .set_status(appointment_id, &doctor.to_session_user(), &request, TOKEN)
        .await
        .unwrap();

    assert_eq!(result.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn unassigned_doctor_cannot_update_status() {
    let mock_server = MockServer::start().await;
    let other_doctor = TestUser::doctor("drother");
    let appointment_id = Uuid::new_v4();

    let booked = MockRows::appointment(
        appointment_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/complete_appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = SetStatusRequest {
        status: AppointmentStatus::Completed,
        diagnosis: None,
        prescription: None,
        notes: None,
    };

    let service = service_against(&mock_server).await;
    let result = service
        .set_status(
            appointment_id,
            &other_doctor.to_session_user(),
            &request,
            TOKEN,
        )
        .await;

    assert_matches!(result, Err(AppointmentError::Forbidden));
}

#[tokio::test]
async fn doctor_cannot_cancel_through_status_update() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("drsmith");
    let appointment_id = Uuid::new_v4();

    let booked = MockRows::appointment(
        appointment_id,
        Uuid::new_v4(),
        doctor.id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked])))
        .mount(&mock_server)
        .await;

    let request = SetStatusRequest {
        status: AppointmentStatus::Cancelled,
        diagnosis: None,
        prescription: None,
        notes: None,
    };

    let service = service_against(&mock_server).await;
    let result = service
        .set_status(appointment_id, &doctor.to_session_user(), &request, TOKEN)
        .await;

    assert_matches!(result, Err(AppointmentError::Forbidden));
}

#[tokio::test]
async fn completing_a_terminal_appointment_reports_already_terminal() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("drsmith");
    let appointment_id = Uuid::new_v4();

    let completed = MockRows::appointment(
        appointment_id,
        Uuid::new_v4(),
        doctor.id,
        "2025-06-01",
        "10:00:00",
        "Completed",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([completed])))
        .mount(&mock_server)
        .await;

    let request = SetStatusRequest {
        status: AppointmentStatus::Completed,
        diagnosis: Some("flu".to_string()),
        prescription: None,
        notes: None,
    };

    let service = service_against(&mock_server).await;
    let result = service
        .set_status(appointment_id, &doctor.to_session_user(), &request, TOKEN)
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::AlreadyTerminal(AppointmentStatus::Completed))
    );
}

// ==============================================================================
// LISTINGS
// ==============================================================================

#[tokio::test]
async fn upcoming_filters_by_date_and_excludes_cancelled() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    let upcoming = MockRows::appointment(
        Uuid::new_v4(),
        patient_id,
        Uuid::new_v4(),
        "2025-06-02",
        "09:00:00",
        "Booked",
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("appointment_date", "gte.2025-06-01"))
        .and(query_param("status", "neq.Cancelled"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([upcoming])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_against(&mock_server).await;
    let appointments = service
        .upcoming_appointments(
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            Some(patient_id),
            None,
            TOKEN,
        )
        .await
        .unwrap();

    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].patient_id, patient_id);
}
