//! End-to-end booking lifecycle against a mocked store: two patients race
//! for one slot, the doctor completes the winner's visit, and a late
//! cancellation bounces off the terminal state.

use assert_matches::assert_matches;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, BookAppointmentRequest, SetStatusRequest,
};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_utils::test_utils::{MockRows, TestConfig, TestUser};
use treatment_cell::services::recording::TreatmentRecordingService;

const TOKEN: &str = "test-token";

#[tokio::test]
async fn full_booking_lifecycle() {
    let mock_server = MockServer::start().await;

    let p1 = TestUser::patient("p1");
    let p2 = TestUser::patient("p2");
    let d1 = TestUser::doctor("d1");
    let appointment_id = Uuid::new_v4();

    // Doctor lookup used by both booking attempts
    Mock::given(method("GET"))
        .and(path("/rest/v1/persons"))
        .and(query_param("id", format!("eq.{}", d1.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            MockRows::doctor(d1.id, "d1", "General Medicine")
        ])))
        .mount(&mock_server)
        .await;

    let booked = MockRows::appointment(
        appointment_id,
        p1.id,
        d1.id,
        "2025-06-01",
        "10:00:00",
        "Booked",
    );
    let completed = MockRows::appointment(
        appointment_id,
        p1.id,
        d1.id,
        "2025-06-01",
        "10:00:00",
        "Completed",
    );

    // Slot check: free for the first booking, taken afterwards
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.Cancelled"))
        .and(query_param("doctor_id", format!("eq.{}", d1.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.Cancelled"))
        .and(query_param("doctor_id", format!("eq.{}", d1.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked.clone()])))
        .mount(&mock_server)
        .await;

    // Exactly one insert happens across both attempts
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([booked.clone()])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // By-id reads: Booked for the completion fetch, Completed afterwards
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([booked.clone()])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([completed.clone()])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/complete_appointment"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([completed.clone()])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let treatment = MockRows::treatment(Uuid::new_v4(), appointment_id, d1.id, "flu");
    Mock::given(method("GET"))
        .and(path("/rest/v1/treatments"))
        .and(query_param("appointment_id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([treatment])))
        .mount(&mock_server)
        .await;

    // A terminal appointment is never patched
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let booking = AppointmentBookingService::new(&config);
    let treatments = TreatmentRecordingService::new(&config);

    let slot_request = |patient: &TestUser| BookAppointmentRequest {
        patient_id: Some(patient.id),
        doctor_id: d1.id,
        appointment_date: "2025-06-01".to_string(),
        appointment_time: "10:00".to_string(),
        reason: Some("checkup".to_string()),
    };

    // P1 books the slot
    let appointment = booking
        .book_appointment(p1.id, &slot_request(&p1), TOKEN)
        .await
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Booked);

    // P2 is rejected for the same slot
    let second = booking
        .book_appointment(p2.id, &slot_request(&p2), TOKEN)
        .await;
    assert_matches!(second, Err(AppointmentError::Conflict));

    // D1 completes the visit with a diagnosis
    let completed_appointment = booking
        .set_status(
            appointment_id,
            &d1.to_session_user(),
            &SetStatusRequest {
                status: AppointmentStatus::Completed,
                diagnosis: Some("flu".to_string()),
                prescription: Some("rest and fluids".to_string()),
                notes: None,
            },
            TOKEN,
        )
        .await
        .unwrap();
    assert_eq!(completed_appointment.status, AppointmentStatus::Completed);

    // The treatment record is readable by the patient
    let record = treatments
        .treatment_for_appointment(appointment_id, &p1.to_session_user(), TOKEN)
        .await
        .unwrap();
    assert_eq!(record.diagnosis.as_deref(), Some("flu"));

    // P1 can no longer cancel
    let cancel = booking
        .cancel_appointment(appointment_id, &p1.to_session_user(), TOKEN)
        .await;
    assert_matches!(
        cancel,
        Err(AppointmentError::AlreadyTerminal(AppointmentStatus::Completed))
    );
}
