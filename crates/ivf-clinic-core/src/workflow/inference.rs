//! Step inference from a cycle's redundant step fields.
//!
//! A cycle states its step three ways, none canonical:
//! 1. `currentStep`, an exact machine identifier
//! 2. `stepType`, matched by uppercase substring with exclusions
//! 3. `cycleName`, matched by lowercase substring
//!
//! Signals are tried in that order and the first match wins.

use serde::{Deserialize, Serialize};

use super::WorkflowStep;
use crate::models::TreatmentCycle;

/// Which field produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StepSignal {
    ExplicitStep,
    StepType,
    CycleName,
}

impl StepSignal {
    pub const PRECEDENCE: [StepSignal; 3] = [
        StepSignal::ExplicitStep,
        StepSignal::StepType,
        StepSignal::CycleName,
    ];
}

/// Check a single signal of `cycle` against `step`.
pub fn signal_matches(cycle: &TreatmentCycle, step: WorkflowStep, signal: StepSignal) -> bool {
    let rule = step.rule();
    match signal {
        StepSignal::ExplicitStep => cycle
            .current_step
            .as_deref()
            .is_some_and(|current| rule.ids.contains(&current)),
        StepSignal::StepType => cycle.step_type.as_deref().is_some_and(|step_type| {
            let upper = step_type.to_uppercase();
            rule.step_type_tokens.iter().any(|t| upper.contains(t))
                && !rule.step_type_exclusions.iter().any(|x| upper.contains(x))
        }),
        StepSignal::CycleName => cycle.cycle_name.as_deref().is_some_and(|name| {
            let lower = name.to_lowercase();
            rule.name_phrases.iter().any(|p| lower.contains(p))
        }),
    }
}

/// First signal, in precedence order, that places `cycle` at `step`.
pub fn infer_step_match(cycle: &TreatmentCycle, step: WorkflowStep) -> Option<StepSignal> {
    StepSignal::PRECEDENCE
        .into_iter()
        .find(|signal| signal_matches(cycle, step, *signal))
}

/// Whether `cycle` is at `step` and so eligible for that step's action.
pub fn is_ready_for(cycle: &TreatmentCycle, step: WorkflowStep) -> bool {
    infer_step_match(cycle, step).is_some()
}

/// Best guess at the cycle's current step.
///
/// Signals are tried in precedence order. Within one signal, when several
/// steps match (a name such as "culture then embryo transfer"), the step
/// furthest along the treatment sequence is taken.
pub fn infer_current_step(cycle: &TreatmentCycle) -> Option<(WorkflowStep, StepSignal)> {
    let sequence = WorkflowStep::sequence(cycle.resolved_treatment_type());
    StepSignal::PRECEDENCE.into_iter().find_map(|signal| {
        sequence
            .iter()
            .rev()
            .find(|step| signal_matches(cycle, **step, signal))
            .map(|step| (*step, signal))
    })
}

/// Every step `cycle` is currently ready for, in sequence order.
pub fn ready_steps(cycle: &TreatmentCycle) -> Vec<WorkflowStep> {
    WorkflowStep::sequence(cycle.resolved_treatment_type())
        .iter()
        .copied()
        .filter(|step| is_ready_for(cycle, *step))
        .collect()
}
