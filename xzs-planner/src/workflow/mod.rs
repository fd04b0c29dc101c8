//! Five-step production workflow
//!
//! A [`session::WorkflowSession`] drives one topic through the fixed step
//! sequence confirm → materials → draft → cooking → publish. Each step
//! component in [`steps`] produces one [`StepOutput`], which the session
//! stores in [`StepData`] under that step's id.

pub mod session;
pub mod steps;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;
use steps::confirm::ConfirmOutput;
use steps::cooking::CookingOutput;
use steps::draft::DraftOutput;
use steps::materials::MaterialsOutput;
use steps::publish::PublishOutput;

pub use session::{SessionState, StateTransition, WorkflowSession};

/// Stable identifier of a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    Confirm,
    Materials,
    Draft,
    Cooking,
    Publish,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Confirm => "confirm",
            StepId::Materials => "materials",
            StepId::Draft => "draft",
            StepId::Cooking => "cooking",
            StepId::Publish => "publish",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StepId::Confirm => "Confirm topic",
            StepId::Materials => "Gather material",
            StepId::Draft => "Outline & draft",
            StepId::Cooking => "Cooking tutorial",
            StepId::Publish => "Publish assets",
        }
    }

    /// Position in the workflow (0-based)
    pub fn index(&self) -> usize {
        match self {
            StepId::Confirm => 0,
            StepId::Materials => 1,
            StepId::Draft => 2,
            StepId::Cooking => 3,
            StepId::Publish => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<StepId> {
        WORKFLOW_STEPS.get(index).copied()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WORKFLOW_STEPS
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| PlannerError::Validation(format!("Unknown step: {}", s)))
    }
}

/// The fixed step sequence
pub const WORKFLOW_STEPS: [StepId; 5] = [
    StepId::Confirm,
    StepId::Materials,
    StepId::Draft,
    StepId::Cooking,
    StepId::Publish,
];

/// Step as shown by a step indicator
///
/// `completed` is always computed from the current index, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStep {
    pub id: StepId,
    pub title: &'static str,
    pub completed: bool,
}

/// Indicator rows for a session at `current_index`
pub fn workflow_steps(current_index: usize) -> Vec<WorkflowStep> {
    WORKFLOW_STEPS
        .iter()
        .enumerate()
        .map(|(i, id)| WorkflowStep {
            id: *id,
            title: id.title(),
            completed: i < current_index,
        })
        .collect()
}

/// Output of one step, keyed by the step that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "lowercase")]
pub enum StepOutput {
    Confirm(ConfirmOutput),
    Materials(MaterialsOutput),
    Draft(DraftOutput),
    Cooking(CookingOutput),
    Publish(PublishOutput),
}

impl StepOutput {
    pub fn step_id(&self) -> StepId {
        match self {
            StepOutput::Confirm(_) => StepId::Confirm,
            StepOutput::Materials(_) => StepId::Materials,
            StepOutput::Draft(_) => StepId::Draft,
            StepOutput::Cooking(_) => StepId::Cooking,
            StepOutput::Publish(_) => StepId::Publish,
        }
    }
}

/// Accumulated step outputs
///
/// Read access is public; only the session writes, and only for the step
/// that is current when it advances.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepData {
    entries: BTreeMap<StepId, StepOutput>,
}

impl StepData {
    pub fn get(&self, step: StepId) -> Option<&StepOutput> {
        self.entries.get(&step)
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.entries.contains_key(&step)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn confirm(&self) -> Option<&ConfirmOutput> {
        match self.entries.get(&StepId::Confirm) {
            Some(StepOutput::Confirm(output)) => Some(output),
            _ => None,
        }
    }

    pub fn materials(&self) -> Option<&MaterialsOutput> {
        match self.entries.get(&StepId::Materials) {
            Some(StepOutput::Materials(output)) => Some(output),
            _ => None,
        }
    }

    pub fn draft(&self) -> Option<&DraftOutput> {
        match self.entries.get(&StepId::Draft) {
            Some(StepOutput::Draft(output)) => Some(output),
            _ => None,
        }
    }

    pub fn cooking(&self) -> Option<&CookingOutput> {
        match self.entries.get(&StepId::Cooking) {
            Some(StepOutput::Cooking(output)) => Some(output),
            _ => None,
        }
    }

    pub fn publish(&self) -> Option<&PublishOutput> {
        match self.entries.get(&StepId::Publish) {
            Some(StepOutput::Publish(output)) => Some(output),
            _ => None,
        }
    }

    /// Replace the entry for the output's own step
    pub(crate) fn insert(&mut self, output: StepOutput) {
        self.entries.insert(output.step_id(), output);
    }
}
