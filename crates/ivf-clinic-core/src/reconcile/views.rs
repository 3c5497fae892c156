//! Composite views assembled from several endpoints.

use serde::{Deserialize, Serialize};

use super::{absent_as_none, first_present, PatientProfile, Reconciler, UNKNOWN_PATIENT};
use crate::api::{ApiResult, Transport};
use crate::models::{
    Appointment, AppointmentAction, DoctorSummary, LabSample, TreatmentCycle,
};
use crate::workflow::{
    ineligibility, ready_steps, Ineligibility, Lineage, SampleScreen, WorkflowProgress,
    WorkflowStep,
};

/// Shown when no doctor name can be resolved.
pub const UNASSIGNED_DOCTOR: &str = "Unassigned";

/// Appointment with its patient and doctor resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentView {
    pub appointment: Appointment,
    pub patient: Option<PatientProfile>,
    pub patient_name: String,
    pub doctor_name: String,
    pub slot_label: Option<String>,
    pub actions: Vec<AppointmentAction>,
}

/// Cycle with its samples, progress and the steps it is ready for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleOverview {
    pub cycle: TreatmentCycle,
    pub patient_name: String,
    pub samples: Vec<LabSample>,
    pub progress: WorkflowProgress,
    pub ready_for: Vec<WorkflowStep>,
}

impl CycleOverview {
    pub fn is_ready_for(&self, step: WorkflowStep) -> bool {
        self.ready_for.contains(&step)
    }
}

/// Samples of a lab screen split into selectable and excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSamples {
    pub screen: SampleScreen,
    pub eligible: Vec<LabSample>,
    pub excluded: Vec<(LabSample, Ineligibility)>,
}

/// Doctor name precedence: nested doctor, first of the doctor list, flat
/// name, separately fetched record, placeholder.
pub fn resolve_doctor_name(appointment: &Appointment, fetched: Option<&DoctorSummary>) -> String {
    first_present(&[
        appointment
            .doctor
            .as_ref()
            .and_then(|d| d.full_name.as_deref()),
        appointment
            .doctors
            .first()
            .and_then(|d| d.full_name.as_deref()),
        appointment.doctor_name.as_deref(),
        fetched.and_then(|d| d.full_name.as_deref()),
    ])
    .unwrap_or(UNASSIGNED_DOCTOR)
    .to_string()
}

fn embedded_doctor_name(appointment: &Appointment) -> bool {
    resolve_doctor_name(appointment, None) != UNASSIGNED_DOCTOR
}

impl<'a, T: Transport> Reconciler<'a, T> {
    /// Appointment view. The patient and doctor are fetched concurrently once
    /// the appointment is known.
    pub async fn appointment_view(&self, appointment_id: &str) -> ApiResult<Option<AppointmentView>> {
        let Some(appointment) =
            absent_as_none(self.client.get::<Appointment>(appointment_id).await)?
        else {
            return Ok(None);
        };

        let doctor_id = appointment
            .assigned_doctor_id()
            .filter(|_| !embedded_doctor_name(&appointment));
        let doctor = async {
            match doctor_id {
                Some(id) => absent_as_none(self.client.get::<DoctorSummary>(id).await),
                None => Ok(None),
            }
        };

        let (patient, doctor) =
            futures::try_join!(self.patient_profile(&appointment.patient_id), doctor)?;

        let doctor_name = resolve_doctor_name(&appointment, doctor.as_ref());
        let patient_name = patient
            .as_ref()
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| UNKNOWN_PATIENT.to_string());

        Ok(Some(AppointmentView {
            slot_label: appointment.slot.as_ref().and_then(|s| s.label()),
            actions: appointment.status.available_actions().to_vec(),
            patient,
            patient_name,
            doctor_name,
            appointment,
        }))
    }

    /// Cycle overview with samples and patient fetched concurrently.
    pub async fn cycle_overview(&self, cycle_id: &str) -> ApiResult<Option<CycleOverview>> {
        let Some(cycle) = absent_as_none(self.client.get::<TreatmentCycle>(cycle_id).await)?
        else {
            return Ok(None);
        };

        let samples = async {
            Ok(absent_as_none(self.client.samples_for_cycle(cycle_id).await)?.unwrap_or_default())
        };
        let (patient, samples) =
            futures::try_join!(self.patient_profile(&cycle.patient_id), samples)?;

        Ok(Some(CycleOverview {
            patient_name: patient
                .map(|p| p.display_name)
                .unwrap_or_else(|| UNKNOWN_PATIENT.to_string()),
            samples,
            progress: WorkflowProgress::for_cycle(&cycle),
            ready_for: ready_steps(&cycle),
            cycle,
        }))
    }

    /// The cycle's treatment lineage. Falls back to the cycle alone when the
    /// sibling list is unavailable.
    pub async fn lineage(&self, cycle: &TreatmentCycle) -> ApiResult<Lineage> {
        let Some(treatment_id) = cycle.treatment_id.as_deref() else {
            return Ok(Lineage::of_cycle(cycle));
        };
        let siblings = absent_as_none(self.client.cycles_for_treatment(treatment_id).await)?
            .unwrap_or_default();
        Ok(Lineage::from_cycles(cycle, &siblings))
    }

    /// Samples of the cycle's patient, split by eligibility for `screen`.
    pub async fn screen_samples(
        &self,
        cycle_id: &str,
        screen: SampleScreen,
    ) -> ApiResult<Option<ScreenSamples>> {
        let Some(cycle) = absent_as_none(self.client.get::<TreatmentCycle>(cycle_id).await)?
        else {
            return Ok(None);
        };

        let samples = async {
            Ok(absent_as_none(self.client.samples_for_patient(&cycle.patient_id).await)?
                .unwrap_or_default())
        };
        let (lineage, samples) = futures::try_join!(self.lineage(&cycle), samples)?;

        let mut eligible = Vec::new();
        let mut excluded = Vec::new();
        for sample in samples {
            match ineligibility(screen, &sample, Some(&lineage)) {
                None => eligible.push(sample),
                Some(reason) => excluded.push((sample, reason)),
            }
        }

        Ok(Some(ScreenSamples {
            screen,
            eligible,
            excluded,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::{ClinicClient, Method};
    use serde_json::json;

    #[test]
    fn test_doctor_name_precedence() {
        let mut appt = Appointment {
            id: "A1".into(),
            patient_id: "P1".into(),
            doctor_name: Some("Dr. Flat".into()),
            ..Default::default()
        };
        assert_eq!(resolve_doctor_name(&appt, None), "Dr. Flat");

        appt.doctors = vec![DoctorSummary {
            id: "D2".into(),
            full_name: Some("Dr. Listed".into()),
            ..Default::default()
        }];
        assert_eq!(resolve_doctor_name(&appt, None), "Dr. Listed");

        let empty = Appointment::default();
        assert_eq!(resolve_doctor_name(&empty, None), UNASSIGNED_DOCTOR);
    }

    #[tokio::test]
    async fn test_appointment_view_fetches_missing_doctor() {
        let mock = MockTransport::new();
        mock.respond_ok(
            Method::Get,
            "/appointment/A1",
            json!({
                "id": "A1",
                "patientId": "P1",
                "doctorId": "D1",
                "status": "Scheduled",
                "slot": {"startTime": "09:00", "endTime": "09:30"}
            }),
        );
        mock.respond_ok(Method::Get, "/patient/P1/details", json!({"id": "P1", "fullName": "Jane Doe"}));
        mock.respond_ok(Method::Get, "/doctor/D1", json!({"id": "D1", "fullName": "Dr. Tran"}));
        let client = ClinicClient::new(mock);

        let view = Reconciler::new(&client)
            .appointment_view("A1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.patient_name, "Jane Doe");
        assert_eq!(view.doctor_name, "Dr. Tran");
        assert_eq!(view.slot_label.as_deref(), Some("09:00 - 09:30"));
        assert!(view.actions.contains(&AppointmentAction::CheckIn));
    }

    #[tokio::test]
    async fn test_appointment_view_missing() {
        let client = ClinicClient::new(MockTransport::new());
        let view = Reconciler::new(&client).appointment_view("A404").await.unwrap();
        assert!(view.is_none());
    }

    #[tokio::test]
    async fn test_cycle_overview() {
        let mock = MockTransport::new();
        mock.respond_ok(
            Method::Get,
            "/treatment-cycle/C1",
            json!({"id": "C1", "patientId": "P1", "stepType": "IVF_EmbryoTransfer"}),
        );
        mock.respond_status(Method::Get, "/patient/P1/details", 403);
        mock.respond_ok(Method::Get, "/patient/P1", json!({"id": "P1", "name": "Mai Nguyen"}));
        mock.respond_ok(
            Method::Get,
            "/sample",
            json!({"data": [{"id": "E1", "sampleType": "Embryo", "status": "Stored"}]}),
        );
        let client = ClinicClient::new(mock);

        let overview = Reconciler::new(&client)
            .cycle_overview("C1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(overview.patient_name, "Mai Nguyen");
        assert_eq!(overview.samples.len(), 1);
        assert!(overview.is_ready_for(WorkflowStep::EmbryoTransfer));
        assert_eq!(overview.progress.current(), Some(WorkflowStep::EmbryoTransfer));
    }

    #[tokio::test]
    async fn test_screen_samples_split() {
        let mock = MockTransport::new();
        mock.respond_ok(
            Method::Get,
            "/treatment-cycle/C2",
            json!({"id": "C2", "patientId": "P1", "treatmentId": "T1"}),
        );
        mock.respond_ok(
            Method::Get,
            "/treatment-cycle",
            json!({"data": [
                {"id": "C1", "patientId": "P1", "treatmentId": "T1"},
                {"id": "C2", "patientId": "P1", "treatmentId": "T1"}
            ]}),
        );
        mock.respond_ok(
            Method::Get,
            "/sample",
            json!({"data": [
                {"id": "O1", "sampleType": "Oocyte", "status": "QualityChecked", "treatmentCycleId": "C1"},
                {"id": "O2", "sampleType": "Oocyte", "status": "QualityChecked", "canFertilize": true},
                {"id": "O3", "sampleType": "Oocyte", "status": "QualityChecked", "treatmentCycleId": "C9"}
            ]}),
        );
        let client = ClinicClient::new(mock);

        let screen = Reconciler::new(&client)
            .screen_samples("C2", SampleScreen::Fertilization)
            .await
            .unwrap()
            .unwrap();

        let eligible: Vec<&str> = screen.eligible.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(eligible, vec!["O1"]);
        assert_eq!(screen.excluded.len(), 2);
        assert_eq!(screen.excluded[0].1, Ineligibility::AlreadyEarmarked);
        assert_eq!(screen.excluded[1].1, Ineligibility::OtherLineage("C9".into()));
    }
}
