//! Workflow steps and the rule table used to recognise them.

use serde::{Deserialize, Serialize};

use crate::models::TreatmentType;

/// A step in an IUI or IVF treatment cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkflowStep {
    Stimulation,
    OocyteRetrieval,
    SpermCollection,
    Fertilization,
    EmbryoCulture,
    EmbryoTransfer,
    Insemination,
    PregnancyTest,
}

/// How a step is recognised on a cycle record.
#[derive(Debug, Clone, Copy)]
pub struct StepRule {
    pub step: WorkflowStep,
    /// Exact machine identifiers accepted in `currentStep`
    pub ids: &'static [&'static str],
    /// Substrings looked for in the uppercased `stepType`
    pub step_type_tokens: &'static [&'static str],
    /// Substrings that veto a `stepType` match
    pub step_type_exclusions: &'static [&'static str],
    /// Lowercase phrases looked for in the cycle name
    pub name_phrases: &'static [&'static str],
}

const RULES: [StepRule; 8] = [
    StepRule {
        step: WorkflowStep::Stimulation,
        ids: &["IVF_Stimulation", "IUI_Stimulation"],
        step_type_tokens: &["STIMULATION"],
        step_type_exclusions: &[],
        name_phrases: &["stimulation"],
    },
    StepRule {
        step: WorkflowStep::OocyteRetrieval,
        ids: &["IVF_OocyteRetrieval", "IVF_EggRetrieval"],
        step_type_tokens: &["OOCYTERETRIEVAL", "EGGRETRIEVAL"],
        step_type_exclusions: &[],
        name_phrases: &["oocyte retrieval", "egg retrieval"],
    },
    StepRule {
        step: WorkflowStep::SpermCollection,
        ids: &["IVF_SpermCollection", "IUI_SpermCollection"],
        step_type_tokens: &["SPERMCOLLECTION", "SPERMPREP"],
        step_type_exclusions: &[],
        name_phrases: &["sperm collection", "sperm preparation"],
    },
    StepRule {
        step: WorkflowStep::Fertilization,
        ids: &["IVF_Fertilization"],
        step_type_tokens: &["FERTILIZATION", "FERTILISATION"],
        step_type_exclusions: &[],
        name_phrases: &["fertilization", "fertilisation", "icsi"],
    },
    StepRule {
        step: WorkflowStep::EmbryoCulture,
        ids: &["IVF_EmbryoCulture"],
        step_type_tokens: &["CULTURE"],
        step_type_exclusions: &[],
        name_phrases: &["culture"],
    },
    StepRule {
        step: WorkflowStep::EmbryoTransfer,
        ids: &["IVF_EmbryoTransfer"],
        step_type_tokens: &["EMBRYOTRANSFER"],
        // a step type naming both culture and transfer is read as culture
        step_type_exclusions: &["CULTURE"],
        name_phrases: &["embryo transfer"],
    },
    StepRule {
        step: WorkflowStep::Insemination,
        ids: &["IUI_Insemination", "IUI_Procedure"],
        step_type_tokens: &["INSEMINATION", "IUI_PROCEDURE"],
        step_type_exclusions: &[],
        name_phrases: &["insemination"],
    },
    StepRule {
        step: WorkflowStep::PregnancyTest,
        ids: &["IVF_PregnancyTest", "IUI_PregnancyTest"],
        step_type_tokens: &["PREGNANCYTEST", "BETAHCG"],
        step_type_exclusions: &[],
        name_phrases: &["pregnancy test", "beta hcg", "beta-hcg"],
    },
];

const IVF_SEQUENCE: [WorkflowStep; 7] = [
    WorkflowStep::Stimulation,
    WorkflowStep::OocyteRetrieval,
    WorkflowStep::SpermCollection,
    WorkflowStep::Fertilization,
    WorkflowStep::EmbryoCulture,
    WorkflowStep::EmbryoTransfer,
    WorkflowStep::PregnancyTest,
];

const IUI_SEQUENCE: [WorkflowStep; 4] = [
    WorkflowStep::Stimulation,
    WorkflowStep::SpermCollection,
    WorkflowStep::Insemination,
    WorkflowStep::PregnancyTest,
];

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 8] = [
        WorkflowStep::Stimulation,
        WorkflowStep::OocyteRetrieval,
        WorkflowStep::SpermCollection,
        WorkflowStep::Fertilization,
        WorkflowStep::EmbryoCulture,
        WorkflowStep::EmbryoTransfer,
        WorkflowStep::Insemination,
        WorkflowStep::PregnancyTest,
    ];

    /// Recognition rule for this step.
    pub fn rule(&self) -> &'static StepRule {
        // RULES is declared in enum order
        &RULES[*self as usize]
    }

    /// Primary machine identifier, as sent back to the backend.
    pub fn id(&self) -> &'static str {
        self.rule().ids[0]
    }

    /// Identifier for a specific treatment type, e.g. `IUI_PregnancyTest`.
    pub fn id_for(&self, treatment: TreatmentType) -> &'static str {
        let prefix = match treatment {
            TreatmentType::Iui => "IUI_",
            TreatmentType::Ivf | TreatmentType::Unknown => "IVF_",
        };
        self.rule()
            .ids
            .iter()
            .copied()
            .find(|id| id.starts_with(prefix))
            .unwrap_or_else(|| self.id())
    }

    /// Whether `id` is one of this step's machine identifiers.
    pub fn matches_id(&self, id: &str) -> bool {
        self.rule().ids.contains(&id)
    }

    /// Parse a step from a CLI-style name ("embryo-transfer", "EmbryoTransfer")
    /// or a machine identifier.
    pub fn parse(input: &str) -> Option<Self> {
        let squashed: String = input
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        WorkflowStep::ALL.into_iter().find(|step| {
            step.matches_id(input)
                || format!("{:?}", step).to_lowercase() == squashed
        })
    }

    /// Ordered steps of a treatment type. Unknown types use the IVF sequence.
    pub fn sequence(treatment: Option<TreatmentType>) -> &'static [WorkflowStep] {
        match treatment {
            Some(TreatmentType::Iui) => &IUI_SEQUENCE,
            _ => &IVF_SEQUENCE,
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WorkflowStep::Stimulation => "Ovarian stimulation",
            WorkflowStep::OocyteRetrieval => "Oocyte retrieval",
            WorkflowStep::SpermCollection => "Sperm collection",
            WorkflowStep::Fertilization => "Fertilization",
            WorkflowStep::EmbryoCulture => "Embryo culture",
            WorkflowStep::EmbryoTransfer => "Embryo transfer",
            WorkflowStep::Insemination => "Insemination",
            WorkflowStep::PregnancyTest => "Pregnancy test",
        };
        f.write_str(label)
    }
}
