//! End-to-end tests of the `Clinic` facade against a scripted transport.

use std::time::Duration;

use ivf_clinic_core::api::mock::MockTransport;
use ivf_clinic_core::{
    Action, ApiError, Clinic, ClinicError, Method, PageQuery, ResourceKind, SampleScreen,
    WorkflowStep,
};
use serde_json::json;

fn clinic() -> Clinic<MockTransport> {
    Clinic::new(MockTransport::new(), Duration::from_secs(60))
}

fn script_appointment(mock: &MockTransport) {
    mock.respond_ok(
        Method::Get,
        "/appointment/A1",
        json!({
            "id": "A1",
            "patientId": "P1",
            "status": "Scheduled",
            "doctor": {"id": "D1", "fullName": "Dr. Tran"}
        }),
    );
    mock.respond_ok(
        Method::Get,
        "/patient/P1/details",
        json!({"data": {"id": "P1", "fullName": "Jane Doe"}}),
    );
}

#[tokio::test]
async fn test_patient_profile_flat_name() {
    let clinic = clinic();
    clinic.client().transport().respond_ok(
        Method::Get,
        "/patient/P1/details",
        json!({"id": "P1", "fullName": "Jane Doe"}),
    );

    let profile = clinic.patient_profile("P1").await.unwrap().unwrap();
    assert_eq!(profile.display_name, "Jane Doe");
    assert_eq!(profile.phone, "N/A");
}

#[tokio::test]
async fn test_reads_are_cached() {
    let clinic = clinic();
    script_appointment(clinic.client().transport());

    let first = clinic.appointment_view("A1").await.unwrap().unwrap();
    let second = clinic.appointment_view("A1").await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.doctor_name, "Dr. Tran");
    let transport = clinic.client().transport();
    assert_eq!(transport.call_count(Method::Get, "/appointment/A1"), 1);
    // embedded doctor name, no separate lookup
    assert_eq!(transport.call_count(Method::Get, "/doctor/D1"), 0);
}

#[tokio::test]
async fn test_check_in_invalidates_appointment_views() {
    let clinic = clinic();
    let transport = clinic.client().transport();
    script_appointment(transport);
    transport.respond_ok(Method::Put, "/appointment/A1/check-in", json!(null));

    clinic.appointment_view("A1").await.unwrap();
    clinic.patient_profile("P1").await.unwrap();

    let report = clinic
        .perform(&Action::CheckIn {
            appointment_id: "A1".into(),
        })
        .await
        .unwrap();

    assert_eq!(report.message, "Patient checked in");
    assert_eq!(report.affected, vec![ResourceKind::Appointment]);
    assert!(report.invalidated.contains(&ResourceKind::Appointment));
    assert!(!report.invalidated.contains(&ResourceKind::Patient));

    clinic.appointment_view("A1").await.unwrap();
    clinic.patient_profile("P1").await.unwrap();
    assert_eq!(transport.call_count(Method::Get, "/appointment/A1"), 2);
    // view fetch, standalone profile, view refetch; the cached profile survives
    assert_eq!(transport.call_count(Method::Get, "/patient/P1/details"), 3);
}

#[tokio::test]
async fn test_validation_short_circuits() {
    let clinic = clinic();

    let result = clinic
        .perform(&Action::CancelAppointment {
            appointment_id: "A1".into(),
            reason: String::new(),
        })
        .await;

    match result {
        Err(e @ ClinicError::Validation(_)) => {
            assert_eq!(e.user_message(), "cancellation reason is required")
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(clinic.client().transport().calls().is_empty());
}

#[tokio::test]
async fn test_write_forbidden_is_terminal() {
    let clinic = clinic();
    clinic.client().transport().respond(
        Method::Put,
        "/appointment/A1/check-in",
        Err(ApiError::from_status(403, Some(r#"{"message":"Receptionists only"}"#))),
    );

    let err = clinic
        .perform(&Action::CheckIn {
            appointment_id: "A1".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Receptionists only");
    assert_eq!(clinic.client().transport().calls().len(), 1);
}

#[tokio::test]
async fn test_partial_transfer_reports_failures() {
    let clinic = clinic();
    let transport = clinic.client().transport();
    transport.respond_ok(Method::Put, "/sample/E1/status", json!(null));
    transport.respond_status(Method::Put, "/sample/E2/status", 500);
    transport.respond_ok(Method::Put, "/sample/E3/status", json!(null));

    let err = clinic
        .perform(&Action::ConfirmTransfer {
            cycle_id: "C1".into(),
            treatment_type: None,
            embryo_ids: vec!["E1".into(), "E2".into(), "E3".into()],
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClinicError::PartialBatch { failed: 1, total: 3, .. }
    ));
    assert_eq!(
        err.user_message(),
        "1 of 3 updates failed: Server error. Completed updates were kept."
    );
    assert_eq!(transport.call_count(Method::Put, "/treatment-cycle/C1/steps"), 0);
}

#[tokio::test]
async fn test_all_failed_batch_shows_server_message() {
    let clinic = clinic();
    clinic.client().transport().respond(
        Method::Put,
        "/sample/O1/fertilize-status",
        Err(ApiError::from_status(409, Some(r#"{"message":"Sample already used"}"#))),
    );

    let err = clinic
        .perform(&Action::MarkForFertilization {
            sample_ids: vec!["O1".into()],
        })
        .await
        .unwrap_err();

    assert!(!err.is_partial());
    assert_eq!(err.user_message(), "Sample already used");
}

#[tokio::test]
async fn test_transfer_with_blank_embryo_sends_nothing() {
    let clinic = clinic();
    clinic
        .client()
        .transport()
        .respond_ok(Method::Put, "/sample/E1/status", json!(null));

    let err = clinic
        .perform(&Action::ConfirmTransfer {
            cycle_id: "C1".into(),
            treatment_type: None,
            embryo_ids: vec!["E1".into(), "".into()],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClinicError::Validation(_)));
    assert!(clinic.client().transport().calls().is_empty());
}

#[tokio::test]
async fn test_cycle_overview_reads_every_sample_page() {
    let clinic = clinic();
    let transport = clinic.client().transport();
    transport.respond_ok(
        Method::Get,
        "/treatment-cycle/C1",
        json!({"id": "C1", "patientId": "P1", "treatmentType": "IVF"}),
    );
    transport.respond_ok(
        Method::Get,
        "/patient/P1/details",
        json!({"id": "P1", "fullName": "Jane Doe"}),
    );
    transport.respond_page(
        Method::Get,
        "/sample",
        1,
        json!({
            "data": [{"id": "O1", "sampleType": "Oocyte"}],
            "total": 2,
            "totalPages": 2,
            "hasNext": true
        }),
    );
    transport.respond_page(
        Method::Get,
        "/sample",
        2,
        json!({
            "data": [{"id": "O2", "sampleType": "Oocyte"}],
            "total": 2,
            "totalPages": 2,
            "hasNext": false
        }),
    );

    let overview = clinic.cycle_overview("C1").await.unwrap().unwrap();
    let ids: Vec<&str> = overview.samples.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["O1", "O2"]);
    assert_eq!(transport.call_count(Method::Get, "/sample"), 2);
}

#[tokio::test]
async fn test_cycle_overview_and_screen() {
    let clinic = clinic();
    let transport = clinic.client().transport();
    transport.respond_ok(
        Method::Get,
        "/treatment-cycle/C1",
        json!({
            "id": "C1",
            "patientId": "P1",
            "treatmentType": "IVF",
            "cycleName": "IVF culture then embryo transfer"
        }),
    );
    transport.respond_status(Method::Get, "/patient/P1/details", 404);
    transport.respond_ok(
        Method::Get,
        "/sample",
        json!({
            "data": [
                {"id": "E1", "sampleType": "Embryo", "status": "Stored"},
                {"id": "E2", "sampleType": "Embryo", "status": "Used",
                 "embryo": {"transferred": true}}
            ],
            "total": 2
        }),
    );

    let overview = clinic.cycle_overview("C1").await.unwrap().unwrap();
    assert_eq!(overview.patient_name, "Unknown patient");
    assert!(overview.is_ready_for(WorkflowStep::EmbryoTransfer));
    assert_eq!(overview.progress.current(), Some(WorkflowStep::EmbryoTransfer));

    let screen = clinic
        .screen_samples("C1", SampleScreen::Transfer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(screen.eligible.len(), 1);
    assert_eq!(screen.eligible[0].id, "E1");
}

#[tokio::test]
async fn test_list_appointments_sends_paging() {
    let clinic = clinic();
    clinic.client().transport().respond_ok(
        Method::Get,
        "/appointment",
        json!({"data": [{"id": "A1", "patientId": "P1"}], "total": 41, "totalPages": 3, "hasNext": true}),
    );

    let query = PageQuery::new(2, 20).filter("doctorId", "D1");
    let page = clinic.list_appointments(&query).await.unwrap();
    assert_eq!(page.total, 41);
    assert!(page.has_next);

    let calls = clinic.client().transport().calls();
    assert_eq!(
        calls[0].query,
        vec![
            ("pageNumber".to_string(), "2".to_string()),
            ("pageSize".to_string(), "20".to_string()),
            ("doctorId".to_string(), "D1".to_string()),
        ]
    );
}
