//! Treatment cycle models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of treatment a cycle belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TreatmentType {
    /// Intrauterine insemination
    Iui,
    /// In-vitro fertilization
    Ivf,
    #[serde(other)]
    Unknown,
}

impl TreatmentType {
    /// Infer the treatment type from a free-text label such as a cycle name
    /// or step identifier.
    pub fn from_label(label: &str) -> Option<Self> {
        let upper = label.to_uppercase();
        if upper.contains("IVF") {
            Some(TreatmentType::Ivf)
        } else if upper.contains("IUI") {
            Some(TreatmentType::Iui)
        } else {
            None
        }
    }
}

/// Cycle status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CycleStatus {
    Planned,
    #[default]
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// A long-lived IUI/IVF workflow record.
///
/// The current step is encoded redundantly in `current_step`, `step_type`
/// and `cycle_name`. See [`crate::workflow`] for how they are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentCycle {
    /// Backend cycle ID
    #[serde(alias = "cycleId", alias = "treatmentCycleId")]
    pub id: String,
    /// Owning patient
    #[serde(default)]
    pub patient_id: String,
    /// Parent treatment plan; sibling cycles share it
    #[serde(default, alias = "treatmentPlanId")]
    pub treatment_id: Option<String>,
    /// IUI or IVF
    #[serde(default)]
    pub treatment_type: Option<TreatmentType>,
    /// Free-text display name
    #[serde(default, alias = "name")]
    pub cycle_name: Option<String>,
    /// Machine-readable step identifier, e.g. "IVF_EmbryoTransfer"
    #[serde(default)]
    pub current_step: Option<String>,
    /// Secondary step-type field
    #[serde(default)]
    pub step_type: Option<String>,
    /// Identifiers of steps already completed
    #[serde(default)]
    pub completed_steps: Vec<String>,
    /// Step identifier → date the step happened or is planned
    #[serde(default)]
    pub step_dates: BTreeMap<String, String>,
    #[serde(default)]
    pub status: CycleStatus,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Outcome text recorded on completion
    #[serde(default)]
    pub outcome: Option<String>,
}

impl TreatmentCycle {
    /// Create a cycle with only an ID and patient, mostly for tests.
    pub fn new(id: impl Into<String>, patient_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            ..Default::default()
        }
    }

    /// Treatment type, inferred from the step or name when not explicit.
    pub fn resolved_treatment_type(&self) -> Option<TreatmentType> {
        match self.treatment_type {
            Some(TreatmentType::Unknown) | None => [
                self.current_step.as_deref(),
                self.step_type.as_deref(),
                self.cycle_name.as_deref(),
            ]
            .into_iter()
            .flatten()
            .find_map(TreatmentType::from_label),
            known => known,
        }
    }

    /// Whether a step identifier is listed as completed.
    pub fn has_completed(&self, step_id: &str) -> bool {
        self.completed_steps.iter().any(|s| s == step_id)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, CycleStatus::Planned | CycleStatus::InProgress)
    }
}
