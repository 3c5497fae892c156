//! Golden tests for workflow step inference and sample eligibility.
//!
//! Each case pins one known combination of the redundant step fields.

use ivf_clinic_core::models::{EmbryoDetail, LabSample, SampleStatus, SampleType, TreatmentCycle};
use ivf_clinic_core::workflow::{
    infer_step_match, ineligibility, is_ready_for, Ineligibility, Lineage, SampleScreen,
    StepSignal, WorkflowStep,
};
use proptest::prelude::*;

/// Step inference case.
struct StepCase {
    id: &'static str,
    current_step: Option<&'static str>,
    step_type: Option<&'static str>,
    cycle_name: Option<&'static str>,
    step: WorkflowStep,
    expected: Option<StepSignal>,
}

fn get_step_cases() -> Vec<StepCase> {
    vec![
        StepCase {
            id: "transfer-step-type",
            current_step: None,
            step_type: Some("IVF_EmbryoTransfer"),
            cycle_name: None,
            step: WorkflowStep::EmbryoTransfer,
            expected: Some(StepSignal::StepType),
        },
        StepCase {
            id: "transfer-name-mentions-culture",
            current_step: None,
            step_type: None,
            cycle_name: Some("IVF culture then embryo transfer"),
            step: WorkflowStep::EmbryoTransfer,
            expected: Some(StepSignal::CycleName),
        },
        StepCase {
            id: "culture-name-mentions-transfer",
            current_step: None,
            step_type: None,
            cycle_name: Some("IVF culture then embryo transfer"),
            step: WorkflowStep::EmbryoCulture,
            expected: Some(StepSignal::CycleName),
        },
        StepCase {
            id: "transfer-step-type-vetoed-by-culture",
            current_step: None,
            step_type: Some("IVF_EmbryoCultureEmbryoTransfer"),
            cycle_name: None,
            step: WorkflowStep::EmbryoTransfer,
            expected: None,
        },
        StepCase {
            id: "culture-step-type-with-transfer",
            current_step: None,
            step_type: Some("IVF_EmbryoCultureEmbryoTransfer"),
            cycle_name: None,
            step: WorkflowStep::EmbryoCulture,
            expected: Some(StepSignal::StepType),
        },
        StepCase {
            id: "vetoed-step-type-falls-to-name",
            current_step: None,
            step_type: Some("IVF_EmbryoCultureEmbryoTransfer"),
            cycle_name: Some("Embryo transfer day 5"),
            step: WorkflowStep::EmbryoTransfer,
            expected: Some(StepSignal::CycleName),
        },
        StepCase {
            id: "explicit-beats-conflicting-type",
            current_step: Some("IVF_EmbryoTransfer"),
            step_type: Some("IVF_Fertilization"),
            cycle_name: Some("Fertilization"),
            step: WorkflowStep::EmbryoTransfer,
            expected: Some(StepSignal::ExplicitStep),
        },
        StepCase {
            id: "explicit-is-case-sensitive",
            current_step: Some("ivf_embryotransfer"),
            step_type: None,
            cycle_name: None,
            step: WorkflowStep::EmbryoTransfer,
            expected: None,
        },
        StepCase {
            id: "lowercase-step-type",
            current_step: None,
            step_type: Some("ivf_embryotransfer"),
            cycle_name: None,
            step: WorkflowStep::EmbryoTransfer,
            expected: Some(StepSignal::StepType),
        },
        StepCase {
            id: "underscored-step-type-misses",
            current_step: None,
            step_type: Some("IVF_EMBRYO_TRANSFER"),
            cycle_name: None,
            step: WorkflowStep::EmbryoTransfer,
            expected: None,
        },
        StepCase {
            id: "name-mixed-case",
            current_step: None,
            step_type: None,
            cycle_name: Some("Embryo Transfer - Day 5"),
            step: WorkflowStep::EmbryoTransfer,
            expected: Some(StepSignal::CycleName),
        },
        StepCase {
            id: "iui-procedure",
            current_step: None,
            step_type: Some("IUI_Procedure"),
            cycle_name: None,
            step: WorkflowStep::Insemination,
            expected: Some(StepSignal::StepType),
        },
        StepCase {
            id: "fertilisation-british",
            current_step: None,
            step_type: None,
            cycle_name: Some("ICSI fertilisation"),
            step: WorkflowStep::Fertilization,
            expected: Some(StepSignal::CycleName),
        },
        StepCase {
            id: "no-signals",
            current_step: None,
            step_type: None,
            cycle_name: None,
            step: WorkflowStep::EmbryoTransfer,
            expected: None,
        },
        StepCase {
            id: "unrelated-signals",
            current_step: Some("IVF_Stimulation"),
            step_type: Some("IVF_Stimulation"),
            cycle_name: Some("Stimulation week 2"),
            step: WorkflowStep::EmbryoTransfer,
            expected: None,
        },
    ]
}

fn cycle_from(case: &StepCase) -> TreatmentCycle {
    let mut cycle = TreatmentCycle::new("C1", "P1");
    cycle.current_step = case.current_step.map(str::to_string);
    cycle.step_type = case.step_type.map(str::to_string);
    cycle.cycle_name = case.cycle_name.map(str::to_string);
    cycle
}

#[test]
fn test_step_golden_cases() {
    let mut failures = Vec::new();

    for case in get_step_cases() {
        let cycle = cycle_from(&case);
        let actual = infer_step_match(&cycle, case.step);
        if actual != case.expected {
            failures.push(format!(
                "[{}] expected {:?}, got {:?}",
                case.id, case.expected, actual
            ));
        }
        assert_eq!(is_ready_for(&cycle, case.step), case.expected.is_some(), "[{}]", case.id);
    }

    if !failures.is_empty() {
        panic!("Step golden failures:\n{}", failures.join("\n"));
    }
}

/// Eligibility case.
struct EligibilityCase {
    id: &'static str,
    sample: fn() -> LabSample,
    screen: SampleScreen,
    expected: Option<Ineligibility>,
}

fn oocyte_checked() -> LabSample {
    LabSample::new("O1", SampleType::Oocyte, SampleStatus::QualityChecked)
}

fn oocyte_earmarked() -> LabSample {
    let mut sample = oocyte_checked();
    sample.can_fertilize = Some(true);
    sample
}

fn sperm_unavailable() -> LabSample {
    let mut sample = LabSample::new("S1", SampleType::Sperm, SampleStatus::Stored);
    sample.is_available = Some(false);
    sample
}

fn embryo_stored() -> LabSample {
    LabSample::new("E1", SampleType::Embryo, SampleStatus::Stored)
}

fn embryo_transferred() -> LabSample {
    let mut sample = embryo_stored();
    sample.embryo = Some(EmbryoDetail {
        transferred: Some(true),
        ..Default::default()
    });
    sample
}

fn embryo_frozen_flag() -> LabSample {
    let mut sample = LabSample::new("E2", SampleType::Embryo, SampleStatus::Fertilized);
    sample.can_frozen = Some(true);
    sample
}

fn oocyte_discarded() -> LabSample {
    LabSample::new("O9", SampleType::Oocyte, SampleStatus::Discarded)
}

fn get_eligibility_cases() -> Vec<EligibilityCase> {
    vec![
        EligibilityCase {
            id: "fertilization-checked-oocyte",
            sample: oocyte_checked,
            screen: SampleScreen::Fertilization,
            expected: None,
        },
        EligibilityCase {
            id: "fertilization-earmarked",
            sample: oocyte_earmarked,
            screen: SampleScreen::Fertilization,
            expected: Some(Ineligibility::AlreadyEarmarked),
        },
        EligibilityCase {
            id: "fertilization-unavailable",
            sample: sperm_unavailable,
            screen: SampleScreen::Fertilization,
            expected: Some(Ineligibility::Unavailable),
        },
        EligibilityCase {
            id: "fertilization-embryo",
            sample: embryo_stored,
            screen: SampleScreen::Fertilization,
            expected: Some(Ineligibility::WrongType(SampleType::Embryo)),
        },
        EligibilityCase {
            id: "transfer-stored-embryo",
            sample: embryo_stored,
            screen: SampleScreen::Transfer,
            expected: None,
        },
        EligibilityCase {
            id: "transfer-already-transferred",
            sample: embryo_transferred,
            screen: SampleScreen::Transfer,
            expected: Some(Ineligibility::AlreadyTransferred),
        },
        EligibilityCase {
            id: "transfer-ignores-frozen-flag",
            sample: embryo_frozen_flag,
            screen: SampleScreen::Transfer,
            expected: None,
        },
        EligibilityCase {
            id: "freezing-already-flagged",
            sample: embryo_frozen_flag,
            screen: SampleScreen::Freezing,
            expected: Some(Ineligibility::AlreadyEarmarked),
        },
        EligibilityCase {
            id: "quality-check-needs-collected",
            sample: oocyte_checked,
            screen: SampleScreen::QualityCheck,
            expected: Some(Ineligibility::Status(SampleStatus::QualityChecked)),
        },
        EligibilityCase {
            id: "discarded-never-eligible",
            sample: oocyte_discarded,
            screen: SampleScreen::Freezing,
            expected: Some(Ineligibility::Status(SampleStatus::Discarded)),
        },
    ]
}

#[test]
fn test_eligibility_golden_cases() {
    let mut failures = Vec::new();

    for case in get_eligibility_cases() {
        let sample = (case.sample)();
        let actual = ineligibility(case.screen, &sample, None);
        if actual != case.expected {
            failures.push(format!(
                "[{}] expected {:?}, got {:?}",
                case.id, case.expected, actual
            ));
        }
    }

    if !failures.is_empty() {
        panic!("Eligibility golden failures:\n{}", failures.join("\n"));
    }
}

#[test]
fn test_lineage_rejects_foreign_cycle() {
    let mut anchor = TreatmentCycle::new("C2", "P1");
    anchor.treatment_id = Some("T1".into());
    let lineage = Lineage::of_cycle(&anchor);

    let mut sample = oocyte_checked();
    sample.treatment_cycle_id = Some("C7".into());
    assert_eq!(
        ineligibility(SampleScreen::Fertilization, &sample, Some(&lineage)),
        Some(Ineligibility::OtherLineage("C7".into()))
    );

    sample.treatment_cycle_id = Some("C2".into());
    assert_eq!(ineligibility(SampleScreen::Fertilization, &sample, Some(&lineage)), None);
}

// =========================================================================
// Properties
// =========================================================================

fn any_step() -> impl Strategy<Value = WorkflowStep> {
    prop::sample::select(WorkflowStep::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_explicit_step_always_ready(
        step in any_step(),
        step_type in proptest::option::of(".{0,24}"),
        name in proptest::option::of(".{0,24}"),
    ) {
        let mut cycle = TreatmentCycle::new("C1", "P1");
        cycle.current_step = Some(step.id().to_string());
        cycle.step_type = step_type;
        cycle.cycle_name = name;
        prop_assert_eq!(infer_step_match(&cycle, step), Some(StepSignal::ExplicitStep));
    }

    #[test]
    fn prop_transfer_token_without_culture(
        prefix in "[A-BD-Z_]{0,8}",
        suffix in "[A-BD-Z_]{0,8}",
    ) {
        let mut cycle = TreatmentCycle::new("C1", "P1");
        cycle.step_type = Some(format!("{}EmbryoTransfer{}", prefix, suffix));
        prop_assert_eq!(
            infer_step_match(&cycle, WorkflowStep::EmbryoTransfer),
            Some(StepSignal::StepType)
        );
    }

    #[test]
    fn prop_digits_never_match(
        current in "[0-9 ]{0,12}",
        step_type in "[0-9 ]{0,12}",
        name in "[0-9 ]{0,12}",
    ) {
        let mut cycle = TreatmentCycle::new("C1", "P1");
        cycle.current_step = Some(current);
        cycle.step_type = Some(step_type);
        cycle.cycle_name = Some(name);
        for step in WorkflowStep::ALL {
            prop_assert!(!is_ready_for(&cycle, step));
        }
    }

    #[test]
    fn prop_earmarked_never_fertilizable(
        status in prop::sample::select(vec![
            SampleStatus::Collected,
            SampleStatus::QualityChecked,
            SampleStatus::Stored,
            SampleStatus::Fertilized,
        ]),
        available in proptest::option::of(any::<bool>()),
    ) {
        let mut sample = LabSample::new("O1", SampleType::Oocyte, status);
        sample.can_fertilize = Some(true);
        sample.is_available = available;
        prop_assert!(ineligibility(SampleScreen::Fertilization, &sample, None).is_some());
    }
}
