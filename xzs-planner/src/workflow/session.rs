//! Workflow session state machine
//!
//! States: LOADING → ACTIVE ⇄ COMPLETING → COMPLETED, with LOADING → ERROR
//! when the topic cannot be fetched.
//!
//! The current step index lives in the session's address (`?step=`). The
//! session only reads it back through [`WorkflowSession::current_step_index`],
//! which also caps it at the furthest step reached so an edited address
//! cannot skip ahead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xzs_common::TopicCandidate;

use crate::address::{write_address, NavigationHistory, SessionView, LAST_STEP_INDEX};
use crate::client::TopicRepository;
use crate::error::{PlannerError, Result};
use crate::recipes::RecipeSource;
use crate::workflow::steps::{ConfirmStep, CookingStep, DraftStep, MaterialsStep, PublishStep};
use crate::workflow::{workflow_steps, StepData, StepId, StepOutput, WorkflowStep};

/// Workflow session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    /// Fetching the topic
    Loading,
    /// Topic could not be loaded; only "go back" is possible
    Error,
    /// Steps can be navigated and advanced
    Active,
    /// Mark-done request in flight
    Completing,
    /// Topic marked done, address is back on the browsing view
    Completed,
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub topic_id: String,
    pub old_state: SessionState,
    pub new_state: SessionState,
    pub transitioned_at: DateTime<Utc>,
}

/// One topic's pass through the five steps
pub struct WorkflowSession {
    topic_id: String,
    topic: Option<TopicCandidate>,
    state: SessionState,
    step_data: StepData,
    history: NavigationHistory,
    furthest_step: usize,
    last_error: Option<String>,
}

impl WorkflowSession {
    /// Session for the workflow address currently in `history`
    pub fn new(history: NavigationHistory) -> Result<Self> {
        let topic_id = match history.view() {
            SessionView::Workflow { topic_id, .. } => topic_id,
            SessionView::Browse { .. } => {
                return Err(PlannerError::InvalidState(format!(
                    "not a workflow address: {}",
                    history.current()
                )))
            }
        };

        Ok(Self {
            topic_id,
            topic: None,
            state: SessionState::Loading,
            step_data: StepData::default(),
            history,
            furthest_step: 0,
            last_error: None,
        })
    }

    /// Transition to new state
    fn transition_to(&mut self, new_state: SessionState) -> StateTransition {
        let transition = StateTransition {
            topic_id: self.topic_id.clone(),
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        info!(
            topic_id = %self.topic_id,
            old_state = ?transition.old_state,
            new_state = ?new_state,
            "Workflow session state transition"
        );
        self.state = new_state;
        transition
    }

    /// Fetch the topic and start at the step named in the address
    pub async fn load(&mut self, repo: &dyn TopicRepository) -> Result<StateTransition> {
        if self.state != SessionState::Loading {
            return Err(PlannerError::InvalidState(format!(
                "session already loaded ({:?})",
                self.state
            )));
        }

        match repo.get_topic(&self.topic_id).await {
            Ok(topic) => {
                self.topic = Some(topic);
                self.step_data = StepData::default();
                self.furthest_step = self.address_step().unwrap_or(0);
                self.last_error = None;
                Ok(self.transition_to(SessionState::Active))
            }
            Err(e) => {
                warn!(topic_id = %self.topic_id, error = %e, "Failed to load workflow topic");
                self.last_error = Some(e.to_string());
                self.transition_to(SessionState::Error);
                Err(e.into())
            }
        }
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    pub fn topic(&self) -> Option<&TopicCandidate> {
        self.topic.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state == SessionState::Completed
    }

    pub fn step_data(&self) -> &StepData {
        &self.step_data
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    /// Hand the address history back to the browsing view
    pub fn into_history(self) -> NavigationHistory {
        self.history
    }

    pub fn current_address(&self) -> &str {
        self.history.current()
    }

    /// Error from the last failed load or completion
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn address_step(&self) -> Option<usize> {
        match self.history.view() {
            SessionView::Workflow { topic_id, step } if topic_id == self.topic_id => Some(step),
            _ => None,
        }
    }

    /// Step index from the address, capped at the furthest step reached
    pub fn current_step_index(&self) -> usize {
        self.address_step()
            .unwrap_or(self.furthest_step)
            .min(self.furthest_step)
            .min(LAST_STEP_INDEX)
    }

    pub fn current_step(&self) -> StepId {
        StepId::from_index(self.current_step_index()).unwrap_or(StepId::Publish)
    }

    /// Step indicator rows; `completed` derived from the current index
    pub fn steps(&self) -> Vec<WorkflowStep> {
        workflow_steps(self.current_step_index())
    }

    fn require_active(&self, action: &str) -> Result<()> {
        if self.state != SessionState::Active {
            return Err(PlannerError::InvalidState(format!(
                "cannot {} while {:?}",
                action, self.state
            )));
        }
        Ok(())
    }

    fn require_topic(&self) -> Result<&TopicCandidate> {
        self.topic
            .as_ref()
            .ok_or_else(|| PlannerError::InvalidState("topic not loaded".to_string()))
    }

    fn push_step(&mut self, index: usize) {
        let address = write_address(&SessionView::Workflow {
            topic_id: self.topic_id.clone(),
            step: index,
        });
        debug!(topic_id = %self.topic_id, step = index, address = %address, "Navigating");
        self.history.push(address);
    }

    /// Store `output` for `step` and move to the next step
    ///
    /// `step` must be the current step, and an output must belong to it.
    /// On the last step only the output is stored.
    pub fn advance(&mut self, step: StepId, output: Option<StepOutput>) -> Result<()> {
        self.require_active("advance")?;

        let current = self.current_step();
        if step != current {
            return Err(PlannerError::InvalidState(format!(
                "step {} cannot advance while {} is current",
                step, current
            )));
        }

        if let Some(output) = output {
            if output.step_id() != step {
                return Err(PlannerError::InvalidState(format!(
                    "output for {} handed to {}",
                    output.step_id(),
                    step
                )));
            }
            self.step_data.insert(output);
        }

        let index = current.index();
        if index < LAST_STEP_INDEX {
            let next = index + 1;
            self.furthest_step = self.furthest_step.max(next);
            self.push_step(next);
            info!(topic_id = %self.topic_id, from = index, to = next, "Advanced workflow step");
        }
        Ok(())
    }

    /// Back one step; step data is kept
    pub fn retreat(&mut self) -> Result<bool> {
        self.require_active("retreat")?;

        let index = self.current_step_index();
        if index == 0 {
            return Ok(false);
        }
        self.push_step(index - 1);
        info!(topic_id = %self.topic_id, from = index, to = index - 1, "Retreated workflow step");
        Ok(true)
    }

    /// Revisit the current or an earlier step; later steps are a no-op
    pub fn jump_to(&mut self, index: usize) -> Result<bool> {
        self.require_active("jump")?;

        let current = self.current_step_index();
        if index > current {
            debug!(topic_id = %self.topic_id, current, requested = index, "Ignoring jump ahead");
            return Ok(false);
        }
        if index < current {
            self.push_step(index);
            info!(topic_id = %self.topic_id, from = current, to = index, "Jumped to workflow step");
        }
        Ok(true)
    }

    /// History back; returns the view now shown
    pub fn back(&mut self) -> Option<SessionView> {
        self.history.back().map(crate::address::derive_state_from_address)
    }

    /// History forward; returns the view now shown
    pub fn forward(&mut self) -> Option<SessionView> {
        self.history.forward().map(crate::address::derive_state_from_address)
    }

    /// True while the address still shows this session
    pub fn is_on_workflow(&self) -> bool {
        self.address_step().is_some()
    }

    /// Leave the session from the error view
    pub fn go_back(&mut self) -> SessionView {
        match self.back() {
            Some(view) => view,
            None => {
                self.history.push(write_address(&SessionView::home()));
                SessionView::home()
            }
        }
    }

    /// Mark the topic done and return to the browsing view
    ///
    /// Only allowed on the last step. A failed request leaves the session
    /// active on the last step with the error recorded for a retry.
    pub async fn complete(
        &mut self,
        repo: &dyn TopicRepository,
        output: Option<StepOutput>,
    ) -> Result<StateTransition> {
        self.require_active("complete")?;
        if self.current_step_index() != LAST_STEP_INDEX {
            return Err(PlannerError::InvalidState(
                "only the last step can complete the workflow".to_string(),
            ));
        }
        if let Some(output) = output {
            if output.step_id() != StepId::Publish {
                return Err(PlannerError::InvalidState(format!(
                    "output for {} handed to {}",
                    output.step_id(),
                    StepId::Publish
                )));
            }
            self.step_data.insert(output);
        }

        let (work_name, dish_name) = {
            let topic = self.require_topic()?;
            (topic.work_name().to_string(), topic.dish_name().to_string())
        };

        self.transition_to(SessionState::Completing);
        match repo.mark_done(&work_name, &dish_name).await {
            Ok(()) => {
                self.last_error = None;
                self.history.push(write_address(&SessionView::home()));
                Ok(self.transition_to(SessionState::Completed))
            }
            Err(e) => {
                warn!(topic_id = %self.topic_id, error = %e, "Failed to mark topic done");
                self.last_error = Some(e.to_string());
                self.transition_to(SessionState::Active);
                Err(e.into())
            }
        }
    }

    pub fn confirm_step(&self) -> Result<ConfirmStep> {
        Ok(ConfirmStep::new(self.require_topic()?, &self.step_data))
    }

    pub fn materials_step(&self) -> Result<MaterialsStep> {
        Ok(MaterialsStep::new(self.require_topic()?, &self.step_data))
    }

    pub fn draft_step(&self) -> Result<DraftStep> {
        Ok(DraftStep::new(self.require_topic()?, &self.step_data))
    }

    pub fn cooking_step(&self, recipes: &dyn RecipeSource) -> Result<CookingStep> {
        Ok(CookingStep::new(self.require_topic()?, &self.step_data, recipes))
    }

    pub fn publish_step(&self) -> Result<PublishStep> {
        Ok(PublishStep::new(self.require_topic()?, &self.step_data))
    }
}
