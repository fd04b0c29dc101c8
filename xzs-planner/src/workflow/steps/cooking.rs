//! Cooking step: per-dish tutorial with progress tracking

use serde::{Deserialize, Serialize};
use xzs_common::TopicCandidate;

use crate::error::Result;
use crate::recipes::{video_links, RecipeSource, TutorialStep, VideoLink};
use crate::workflow::{StepData, StepOutput};

/// Tutorial stage with the user's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookingStepState {
    #[serde(flatten)]
    pub step: TutorialStep,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookingOutput {
    pub cooking_steps: Vec<CookingStepState>,
}

pub struct CookingStep {
    dish_name: String,
    steps: Vec<CookingStepState>,
    video_links: Vec<VideoLink>,
    current: usize,
}

impl CookingStep {
    /// Restore saved progress, or start from the dish's tutorial
    pub fn new(topic: &TopicCandidate, data: &StepData, recipes: &dyn RecipeSource) -> Self {
        let dish_name = topic.dish_name().to_string();
        let steps = match data.cooking() {
            Some(saved) => saved.cooking_steps.clone(),
            None => recipes
                .lookup_steps(&dish_name)
                .into_iter()
                .map(|step| CookingStepState {
                    step,
                    completed: false,
                    expanded: false,
                })
                .collect(),
        };

        Self {
            video_links: video_links(&dish_name),
            dish_name,
            steps,
            current: 0,
        }
    }

    pub fn dish_name(&self) -> &str {
        &self.dish_name
    }

    pub fn steps(&self) -> &[CookingStepState] {
        &self.steps
    }

    pub fn video_links(&self) -> &[VideoLink] {
        &self.video_links
    }

    /// Index of the focused stage
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn toggle_completed(&mut self, id: &str) -> bool {
        match self.steps.iter_mut().find(|s| s.step.id == id) {
            Some(s) => {
                s.completed = !s.completed;
                true
            }
            None => false,
        }
    }

    pub fn toggle_expanded(&mut self, id: &str) -> bool {
        match self.steps.iter_mut().find(|s| s.step.id == id) {
            Some(s) => {
                s.expanded = !s.expanded;
                true
            }
            None => false,
        }
    }

    /// Focus a stage and make sure it is expanded; others keep their state
    pub fn expand_step(&mut self, index: usize) -> bool {
        match self.steps.get_mut(index) {
            Some(s) => {
                s.expanded = true;
                self.current = index;
                true
            }
            None => false,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.completed).count()
    }

    /// Estimated minutes: the first number in each duration, summed
    pub fn total_minutes(&self) -> u32 {
        self.steps
            .iter()
            .filter_map(|s| s.step.duration.as_deref())
            .filter_map(leading_number)
            .sum()
    }

    pub fn can_advance(&self) -> bool {
        true
    }

    pub fn next(&self) -> Result<StepOutput> {
        Ok(StepOutput::Cooking(CookingOutput {
            cooking_steps: self.steps.clone(),
        }))
    }
}

fn leading_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
