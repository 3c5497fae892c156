//! Sample eligibility for the lab screens.
//!
//! Each screen layers the same kinds of predicate: sample type, allowed
//! status, availability, an "already earmarked" flag, and treatment lineage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{LabSample, SampleStatus, SampleType, TreatmentCycle};

/// Lab screens that pick samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleScreen {
    QualityCheck,
    Fertilization,
    Transfer,
    Freezing,
}

/// Flag that marks a sample as already set aside for this screen's purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Earmark {
    None,
    Fertilize,
    Frozen,
}

/// Predicates for one screen.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityRule {
    pub sample_types: &'static [SampleType],
    pub statuses: &'static [SampleStatus],
    pub earmark: Earmark,
    pub exclude_transferred: bool,
}

/// Why a sample was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ineligibility {
    WrongType(SampleType),
    Status(SampleStatus),
    Unavailable,
    AlreadyEarmarked,
    AlreadyTransferred,
    OtherLineage(String),
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ineligibility::WrongType(t) => write!(f, "sample type {:?} not used here", t),
            Ineligibility::Status(s) => write!(f, "status {:?} not allowed", s),
            Ineligibility::Unavailable => f.write_str("marked unavailable"),
            Ineligibility::AlreadyEarmarked => f.write_str("already earmarked"),
            Ineligibility::AlreadyTransferred => f.write_str("already transferred"),
            Ineligibility::OtherLineage(cycle) => {
                write!(f, "belongs to cycle {} of another treatment", cycle)
            }
        }
    }
}

impl SampleScreen {
    pub fn rule(&self) -> EligibilityRule {
        use SampleStatus::*;
        use SampleType::*;
        match self {
            SampleScreen::QualityCheck => EligibilityRule {
                sample_types: &[Sperm, Oocyte, Embryo],
                statuses: &[Collected],
                earmark: Earmark::None,
                exclude_transferred: false,
            },
            SampleScreen::Fertilization => EligibilityRule {
                sample_types: &[Sperm, Oocyte],
                statuses: &[QualityChecked, Stored],
                earmark: Earmark::Fertilize,
                exclude_transferred: false,
            },
            SampleScreen::Transfer => EligibilityRule {
                sample_types: &[Embryo],
                statuses: &[QualityChecked, Fertilized, Stored],
                earmark: Earmark::None,
                exclude_transferred: true,
            },
            SampleScreen::Freezing => EligibilityRule {
                sample_types: &[Sperm, Oocyte, Embryo],
                statuses: &[QualityChecked, Fertilized],
                earmark: Earmark::Frozen,
                exclude_transferred: true,
            },
        }
    }

    /// Parse a CLI-style screen name.
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "qualitycheck" | "qc" => Some(SampleScreen::QualityCheck),
            "fertilization" | "fertilisation" => Some(SampleScreen::Fertilization),
            "transfer" | "embryotransfer" => Some(SampleScreen::Transfer),
            "freezing" | "freeze" => Some(SampleScreen::Freezing),
            _ => None,
        }
    }
}

/// Set of cycle IDs belonging to one treatment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    cycle_ids: BTreeSet<String>,
}

impl Lineage {
    /// Lineage containing only `cycle`.
    pub fn of_cycle(cycle: &TreatmentCycle) -> Self {
        Self {
            cycle_ids: BTreeSet::from([cycle.id.clone()]),
        }
    }

    /// `anchor` plus every cycle in `cycles` sharing its treatment ID.
    pub fn from_cycles(anchor: &TreatmentCycle, cycles: &[TreatmentCycle]) -> Self {
        let mut lineage = Self::of_cycle(anchor);
        if let Some(treatment_id) = anchor.treatment_id.as_deref() {
            lineage.cycle_ids.extend(
                cycles
                    .iter()
                    .filter(|c| c.treatment_id.as_deref() == Some(treatment_id))
                    .map(|c| c.id.clone()),
            );
        }
        lineage
    }

    /// Unlinked samples are accepted.
    pub fn admits(&self, sample: &LabSample) -> bool {
        match sample.treatment_cycle_id.as_deref() {
            None => true,
            Some(id) => self.cycle_ids.contains(id),
        }
    }

    pub fn len(&self) -> usize {
        self.cycle_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycle_ids.is_empty()
    }
}

/// First reason `sample` is not eligible for `screen`, or `None` if it is.
pub fn ineligibility(
    screen: SampleScreen,
    sample: &LabSample,
    lineage: Option<&Lineage>,
) -> Option<Ineligibility> {
    let rule = screen.rule();

    if !rule.sample_types.contains(&sample.sample_type) {
        return Some(Ineligibility::WrongType(sample.sample_type));
    }
    if !rule.statuses.contains(&sample.status) {
        return Some(Ineligibility::Status(sample.status));
    }
    if sample.is_available == Some(false) {
        return Some(Ineligibility::Unavailable);
    }
    let earmarked = match rule.earmark {
        Earmark::None => false,
        Earmark::Fertilize => sample.can_fertilize == Some(true),
        Earmark::Frozen => sample.can_frozen == Some(true),
    };
    if earmarked {
        return Some(Ineligibility::AlreadyEarmarked);
    }
    if rule.exclude_transferred && sample.is_transferred() {
        return Some(Ineligibility::AlreadyTransferred);
    }
    if let Some(lineage) = lineage {
        if !lineage.admits(sample) {
            let cycle = sample.treatment_cycle_id.clone().unwrap_or_default();
            return Some(Ineligibility::OtherLineage(cycle));
        }
    }
    None
}

pub fn is_eligible(screen: SampleScreen, sample: &LabSample, lineage: Option<&Lineage>) -> bool {
    ineligibility(screen, sample, lineage).is_none()
}

/// Samples from `samples` eligible for `screen`, in input order.
pub fn eligible_samples<'a>(
    screen: SampleScreen,
    samples: &'a [LabSample],
    lineage: Option<&Lineage>,
) -> Vec<&'a LabSample> {
    samples
        .iter()
        .filter(|s| is_eligible(screen, s, lineage))
        .collect()
}
