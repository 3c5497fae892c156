//! Lab sample models (sperm, oocyte, embryo).

use serde::{Deserialize, Serialize};

/// Specimen type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SampleType {
    Sperm,
    Oocyte,
    Embryo,
    #[serde(other)]
    Unknown,
}

/// Specimen status.
///
/// Approximate lifecycle: `Collected → QualityChecked → {Fertilized |
/// Discarded | Stored | Used}`, with stored and fertilized material moving on
/// to `Used` or `Discarded`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SampleStatus {
    #[default]
    Collected,
    QualityChecked,
    Fertilized,
    Discarded,
    Stored,
    Used,
    #[serde(other)]
    Unknown,
}

impl SampleStatus {
    /// Statuses reachable in one step from this one.
    pub fn next_statuses(&self) -> &'static [SampleStatus] {
        use SampleStatus::*;
        match self {
            Collected => &[QualityChecked, Discarded],
            QualityChecked => &[Fertilized, Discarded, Stored, Used],
            Fertilized => &[Stored, Used, Discarded],
            Stored => &[Used, Discarded],
            Discarded | Used | Unknown => &[],
        }
    }

    /// Check whether the UI should offer a move to `next`.
    pub fn can_transition_to(&self, next: SampleStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_statuses().is_empty()
    }
}

/// Sperm-specific analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpermDetail {
    /// Million per mL
    #[serde(default)]
    pub concentration: Option<f64>,
    /// Percent
    #[serde(default)]
    pub motility: Option<f64>,
    /// Percent normal forms
    #[serde(default)]
    pub morphology: Option<f64>,
    #[serde(default)]
    pub volume_ml: Option<f64>,
}

/// Oocyte-specific grading.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OocyteDetail {
    /// e.g. "MII", "MI", "GV"
    #[serde(default)]
    pub maturity_stage: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

/// Embryo-specific grading.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbryoDetail {
    #[serde(default)]
    pub grade: Option<String>,
    /// Days since fertilization
    #[serde(default)]
    pub day: Option<u8>,
    #[serde(default)]
    pub cell_count: Option<u32>,
    /// Set once the embryo has been transferred
    #[serde(default)]
    pub transferred: Option<bool>,
}

/// A lab specimen record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabSample {
    #[serde(alias = "sampleId")]
    pub id: String,
    #[serde(default)]
    pub sample_code: Option<String>,
    pub sample_type: SampleType,
    #[serde(default)]
    pub status: SampleStatus,
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Cycle this sample was collected for; absent on legacy samples
    #[serde(default)]
    pub treatment_cycle_id: Option<String>,
    #[serde(default)]
    pub is_available: Option<bool>,
    /// Already earmarked for fertilization
    #[serde(default)]
    pub can_fertilize: Option<bool>,
    /// Already earmarked for freezing
    #[serde(default)]
    pub can_frozen: Option<bool>,
    #[serde(default)]
    pub collection_date: Option<String>,
    #[serde(default)]
    pub sperm: Option<SpermDetail>,
    #[serde(default)]
    pub oocyte: Option<OocyteDetail>,
    #[serde(default)]
    pub embryo: Option<EmbryoDetail>,
}

impl LabSample {
    /// Create a sample with the given type and status, mostly for tests.
    pub fn new(id: impl Into<String>, sample_type: SampleType, status: SampleStatus) -> Self {
        Self {
            id: id.into(),
            sample_code: None,
            sample_type,
            status,
            patient_id: None,
            treatment_cycle_id: None,
            is_available: None,
            can_fertilize: None,
            can_frozen: None,
            collection_date: None,
            sperm: None,
            oocyte: None,
            embryo: None,
        }
    }

    /// Label for lists: the sample code when present, else the ID.
    pub fn label(&self) -> &str {
        self.sample_code.as_deref().unwrap_or(&self.id)
    }

    /// Whether the embryo detail says this embryo was already transferred.
    pub fn is_transferred(&self) -> bool {
        self.embryo
            .as_ref()
            .and_then(|e| e.transferred)
            .unwrap_or(false)
    }
}
