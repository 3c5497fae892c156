//! Step-by-step progress of a cycle, for timeline displays.

use serde::{Deserialize, Serialize};

use super::{infer_current_step, StepSignal, WorkflowStep};
use crate::models::{CycleStatus, TreatmentCycle, TreatmentType};

/// Display state of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}

/// One row of the progress timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub step: WorkflowStep,
    pub state: StepState,
    /// Date recorded in `stepDates`, if any
    pub date: Option<String>,
}

/// Ordered progress of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub treatment_type: Option<TreatmentType>,
    pub steps: Vec<StepProgress>,
    /// Signal the current step was read from
    pub current_signal: Option<StepSignal>,
}

impl WorkflowProgress {
    /// Build the timeline for `cycle`.
    ///
    /// Steps before the inferred current step, or listed in
    /// `completedSteps`, are completed. A completed cycle has every step
    /// completed.
    pub fn for_cycle(cycle: &TreatmentCycle) -> Self {
        let treatment_type = cycle.resolved_treatment_type();
        let sequence = WorkflowStep::sequence(treatment_type);
        let current = infer_current_step(cycle);
        let current_index = current
            .and_then(|(step, _)| sequence.iter().position(|s| *s == step));
        let finished = cycle.status == CycleStatus::Completed;

        let steps = sequence
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let listed_done = step.rule().ids.iter().any(|id| cycle.has_completed(id));
                let state = if finished || listed_done || current_index.is_some_and(|c| index < c)
                {
                    StepState::Completed
                } else if current_index == Some(index) {
                    StepState::Current
                } else {
                    StepState::Upcoming
                };
                let date = step
                    .rule()
                    .ids
                    .iter()
                    .find_map(|id| cycle.step_dates.get(*id).cloned());
                StepProgress {
                    step: *step,
                    state,
                    date,
                }
            })
            .collect();

        Self {
            treatment_type,
            steps,
            current_signal: current.map(|(_, signal)| signal),
        }
    }

    /// The current step, if one could be inferred and is not yet completed.
    pub fn current(&self) -> Option<WorkflowStep> {
        self.steps
            .iter()
            .find(|s| s.state == StepState::Current)
            .map(|s| s.step)
    }

    pub fn completed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.state == StepState::Completed)
            .count()
    }

    /// Completion ratio in `0.0..=1.0`.
    pub fn fraction_complete(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.steps.len() as f64
    }
}
