//! Appointment models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DoctorSummary;

/// Appointment status as reported by the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    /// Requested, no doctor confirmed yet
    #[default]
    Pending,
    /// Confirmed with a time slot
    Scheduled,
    /// Patient has arrived
    CheckedIn,
    /// Visit finished
    Completed,
    /// Cancelled by staff or patient
    Cancelled,
    /// Patient did not show up
    NoShow,
    /// Any status string this client does not know
    #[serde(other)]
    Unknown,
}

/// Buttons the appointment screens can enable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentAction {
    CheckIn,
    CheckOut,
    Cancel,
    AssignDoctor,
}

impl AppointmentStatus {
    /// Actions enabled for the last-known status.
    ///
    /// Client-side gating only. The backend still decides whether a
    /// transition is allowed.
    pub fn available_actions(&self) -> &'static [AppointmentAction] {
        use AppointmentAction::*;
        match self {
            AppointmentStatus::Pending => &[AssignDoctor, Cancel],
            AppointmentStatus::Scheduled => &[CheckIn, AssignDoctor, Cancel],
            AppointmentStatus::CheckedIn => &[CheckOut],
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow
            | AppointmentStatus::Unknown => &[],
        }
    }

    /// Check whether an action is enabled for this status.
    pub fn allows(&self, action: AppointmentAction) -> bool {
        self.available_actions().contains(&action)
    }

    /// Whether no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

/// Time window of an appointment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(default, alias = "startTime")]
    pub start: Option<String>,
    #[serde(default, alias = "endTime")]
    pub end: Option<String>,
}

impl Slot {
    /// Render as "HH:MM - HH:MM", falling back to whichever end is known.
    pub fn label(&self) -> Option<String> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Some(format!("{} - {}", start, end)),
            (Some(start), None) => Some(start.clone()),
            (None, Some(end)) => Some(end.clone()),
            (None, None) => None,
        }
    }
}

/// A scheduling record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Backend appointment ID
    #[serde(alias = "appointmentId")]
    pub id: String,
    /// Patient the appointment belongs to
    pub patient_id: String,
    /// Appointment date (ISO date or datetime string)
    #[serde(default, alias = "date")]
    pub appointment_date: Option<String>,
    /// Time window
    #[serde(default)]
    pub slot: Option<Slot>,
    /// Assigned doctor ID (flat shape)
    #[serde(default)]
    pub doctor_id: Option<String>,
    /// Assigned doctor name (flat shape)
    #[serde(default)]
    pub doctor_name: Option<String>,
    /// Assigned doctor (nested shape)
    #[serde(default)]
    pub doctor: Option<DoctorSummary>,
    /// All assigned doctors (multi-doctor shape)
    #[serde(default)]
    pub doctors: Vec<DoctorSummary>,
    /// Status
    #[serde(default)]
    pub status: AppointmentStatus,
    /// Linked service request, if any
    #[serde(default)]
    pub service_request_id: Option<String>,
    /// Linked treatment cycle, if any
    #[serde(default)]
    pub treatment_cycle_id: Option<String>,
    /// Free-text note
    #[serde(default)]
    pub note: Option<String>,
    /// Reason recorded on cancellation
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

impl Appointment {
    /// Parse the appointment date, tolerating a trailing time component.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.appointment_date.as_deref()?;
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Resolve the assigned doctor ID across the three shapes.
    pub fn assigned_doctor_id(&self) -> Option<&str> {
        self.doctor
            .as_ref()
            .map(|d| d.id.as_str())
            .or_else(|| self.doctors.first().map(|d| d.id.as_str()))
            .or(self.doctor_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_deserializes() {
        let json = r#"{"id":"A1","patientId":"P1","status":"Rescheduled"}"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Unknown);
        assert!(appt.status.available_actions().is_empty());
    }

    #[test]
    fn test_available_actions() {
        assert!(AppointmentStatus::Scheduled.allows(AppointmentAction::CheckIn));
        assert!(!AppointmentStatus::Pending.allows(AppointmentAction::CheckIn));
        assert!(AppointmentStatus::CheckedIn.allows(AppointmentAction::CheckOut));
        assert!(!AppointmentStatus::Cancelled.allows(AppointmentAction::Cancel));
        assert!(AppointmentStatus::NoShow.is_terminal());
    }

    #[test]
    fn test_date_with_time_component() {
        let appt = Appointment {
            id: "A1".into(),
            patient_id: "P1".into(),
            appointment_date: Some("2024-03-05T09:30:00".into()),
            ..Default::default()
        };
        assert_eq!(appt.date(), NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn test_assigned_doctor_precedence() {
        let mut appt = Appointment {
            id: "A1".into(),
            patient_id: "P1".into(),
            doctor_id: Some("D-flat".into()),
            ..Default::default()
        };
        assert_eq!(appt.assigned_doctor_id(), Some("D-flat"));

        appt.doctors = vec![DoctorSummary::new("D-list")];
        assert_eq!(appt.assigned_doctor_id(), Some("D-list"));

        appt.doctor = Some(DoctorSummary::new("D-nested"));
        assert_eq!(appt.assigned_doctor_id(), Some("D-nested"));
    }

    #[test]
    fn test_slot_label() {
        let slot = Slot {
            start: Some("09:00".into()),
            end: Some("09:30".into()),
        };
        assert_eq!(slot.label().as_deref(), Some("09:00 - 09:30"));
        assert_eq!(Slot::default().label(), None);
    }
}
