//! Named state-changing actions.
//!
//! Each action checks its inputs for presence, performs one or more backend
//! calls, and names the resource kinds it mutates so the cache can drop
//! everything derived from them. The backend is trusted to be atomic per
//! call; multi-call actions are not compensated when a later call fails.

mod batch;

pub use batch::*;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{ClinicClient, ResourceKind, Transport};
use crate::models::{SampleStatus, TreatmentType};
use crate::workflow::WorkflowStep;
use crate::{ClinicError, ClinicResult};

/// Note recorded on embryos used in a transfer.
pub const TRANSFER_NOTE: &str = "Transferred";

/// A state-changing operation against the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    CheckIn {
        appointment_id: String,
    },
    CheckOut {
        appointment_id: String,
    },
    CancelAppointment {
        appointment_id: String,
        reason: String,
    },
    AssignDoctor {
        appointment_id: String,
        doctor_id: String,
    },
    UpdateSampleStatus {
        sample_id: String,
        status: SampleStatus,
        note: Option<String>,
    },
    /// Record a passed quality check on a collected sample
    QualityCheck {
        sample_id: String,
        note: Option<String>,
    },
    MarkForFertilization {
        sample_ids: Vec<String>,
    },
    MarkForFreezing {
        sample_ids: Vec<String>,
    },
    /// Mark embryos as used, then complete the cycle's transfer step
    ConfirmTransfer {
        cycle_id: String,
        treatment_type: Option<TreatmentType>,
        embryo_ids: Vec<String>,
    },
    CompleteCycle {
        cycle_id: String,
        outcome: Option<String>,
    },
}

fn required(value: &str, message: &str) -> ClinicResult<()> {
    if value.trim().is_empty() {
        return Err(ClinicError::Validation(message.to_string()));
    }
    Ok(())
}

fn required_selection(ids: &[String], message: &str) -> ClinicResult<()> {
    if ids.is_empty() {
        return Err(ClinicError::Validation(message.to_string()));
    }
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ClinicError::Validation("selection contains a blank id".to_string()));
    }
    Ok(())
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CheckIn { .. } => "check-in",
            Action::CheckOut { .. } => "check-out",
            Action::CancelAppointment { .. } => "cancel-appointment",
            Action::AssignDoctor { .. } => "assign-doctor",
            Action::UpdateSampleStatus { .. } => "update-sample-status",
            Action::QualityCheck { .. } => "quality-check",
            Action::MarkForFertilization { .. } => "mark-for-fertilization",
            Action::MarkForFreezing { .. } => "mark-for-freezing",
            Action::ConfirmTransfer { .. } => "confirm-transfer",
            Action::CompleteCycle { .. } => "complete-cycle",
        }
    }

    /// Presence checks only. Runs before any backend call.
    pub fn validate(&self) -> ClinicResult<()> {
        match self {
            Action::CheckIn { appointment_id } | Action::CheckOut { appointment_id } => {
                required(appointment_id, "appointment is required")
            }
            Action::CancelAppointment {
                appointment_id,
                reason,
            } => {
                required(appointment_id, "appointment is required")?;
                required(reason, "cancellation reason is required")
            }
            Action::AssignDoctor {
                appointment_id,
                doctor_id,
            } => {
                required(appointment_id, "appointment is required")?;
                required(doctor_id, "select a doctor")
            }
            Action::UpdateSampleStatus {
                sample_id, status, ..
            } => {
                required(sample_id, "sample is required")?;
                if *status == SampleStatus::Unknown {
                    return Err(ClinicError::Validation("select a sample status".into()));
                }
                Ok(())
            }
            Action::QualityCheck { sample_id, .. } => required(sample_id, "sample is required"),
            Action::MarkForFertilization { sample_ids } | Action::MarkForFreezing { sample_ids } => {
                required_selection(sample_ids, "select at least one sample")
            }
            Action::ConfirmTransfer {
                cycle_id,
                embryo_ids,
                ..
            } => {
                required(cycle_id, "treatment cycle is required")?;
                required_selection(embryo_ids, "select at least one embryo")
            }
            Action::CompleteCycle { cycle_id, .. } => {
                required(cycle_id, "treatment cycle is required")
            }
        }
    }

    /// Resource kinds this action writes to.
    pub fn affected_resources(&self) -> &'static [ResourceKind] {
        match self {
            Action::CheckIn { .. }
            | Action::CheckOut { .. }
            | Action::CancelAppointment { .. }
            | Action::AssignDoctor { .. } => &[ResourceKind::Appointment],
            Action::UpdateSampleStatus { .. }
            | Action::QualityCheck { .. }
            | Action::MarkForFertilization { .. }
            | Action::MarkForFreezing { .. } => &[ResourceKind::Sample],
            Action::ConfirmTransfer { .. } => &[ResourceKind::Sample, ResourceKind::TreatmentCycle],
            Action::CompleteCycle { .. } => &[ResourceKind::TreatmentCycle],
        }
    }

    /// Notification text shown after success.
    pub fn success_message(&self) -> String {
        match self {
            Action::CheckIn { .. } => "Patient checked in".to_string(),
            Action::CheckOut { .. } => "Patient checked out".to_string(),
            Action::CancelAppointment { .. } => "Appointment cancelled".to_string(),
            Action::AssignDoctor { .. } => "Doctor assigned".to_string(),
            Action::UpdateSampleStatus { status, .. } => {
                format!("Sample status updated to {:?}", status)
            }
            Action::QualityCheck { .. } => "Quality check recorded".to_string(),
            Action::MarkForFertilization { sample_ids } => {
                format!("{} sample(s) marked for fertilization", sample_ids.len())
            }
            Action::MarkForFreezing { sample_ids } => {
                format!("{} sample(s) marked for freezing", sample_ids.len())
            }
            Action::ConfirmTransfer { embryo_ids, .. } => {
                format!("Transfer confirmed for {} embryo(s)", embryo_ids.len())
            }
            Action::CompleteCycle { .. } => "Treatment cycle completed".to_string(),
        }
    }

    /// Run the backend calls for this action. Does not validate.
    pub async fn execute<T: Transport>(&self, client: &ClinicClient<T>) -> ClinicResult<()> {
        match self {
            Action::CheckIn { appointment_id } => client.check_in(appointment_id).await?,
            Action::CheckOut { appointment_id } => client.check_out(appointment_id).await?,
            Action::CancelAppointment {
                appointment_id,
                reason,
            } => client.cancel_appointment(appointment_id, reason.trim()).await?,
            Action::AssignDoctor {
                appointment_id,
                doctor_id,
            } => client.assign_doctor(appointment_id, doctor_id).await?,
            Action::UpdateSampleStatus {
                sample_id,
                status,
                note,
            } => {
                client
                    .update_sample_status(sample_id, *status, note.as_deref())
                    .await?
            }
            Action::QualityCheck { sample_id, note } => {
                client
                    .update_sample_status(sample_id, SampleStatus::QualityChecked, note.as_deref())
                    .await?
            }
            Action::MarkForFertilization { sample_ids } => {
                run_batch(sample_ids, |id| client.update_fertilize_status(id, true))
                    .await
                    .into_result()?
            }
            Action::MarkForFreezing { sample_ids } => {
                run_batch(sample_ids, |id| client.update_frozen_status(id, true))
                    .await
                    .into_result()?
            }
            Action::ConfirmTransfer {
                cycle_id,
                treatment_type,
                embryo_ids,
            } => {
                let outcome = run_batch(embryo_ids, |id| {
                    client.update_sample_status(id, SampleStatus::Used, Some(TRANSFER_NOTE))
                })
                .await;
                if !outcome.succeeded() {
                    warn!(
                        cycle_id = %cycle_id,
                        failed = outcome.failure_count(),
                        total = outcome.total(),
                        "embryo updates failed, cycle left unchanged"
                    );
                    return outcome.into_result();
                }
                let step_id = WorkflowStep::EmbryoTransfer
                    .id_for(treatment_type.unwrap_or(TreatmentType::Ivf));
                client.complete_cycle_step(cycle_id, step_id).await?
            }
            Action::CompleteCycle { cycle_id, outcome } => {
                client
                    .complete_treatment_cycle(cycle_id, outcome.as_deref())
                    .await?
            }
        }
        Ok(())
    }
}

/// Result of a completed action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub action: &'static str,
    pub affected: Vec<ResourceKind>,
    pub invalidated: Vec<ResourceKind>,
    pub message: String,
}
