//! Publish step: cover captions and post titles
//!
//! Candidates come from the two highest-scoring story angles plus lines
//! tailored to the topic kind. Completing the workflow from here goes
//! through `WorkflowSession::complete`, not an ordinary advance.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::info;
use xzs_common::{TopicCandidate, TopicKind};

use crate::error::{PlannerError, Result};
use crate::workflow::{StepData, StepOutput};

/// Longest cover caption, in characters
pub const MAX_CAPTION_CHARS: usize = 15;

/// Angle descriptions and hooks longer than this are not used as titles
pub const MAX_BORROWED_TITLE_CHARS: usize = 35;

/// Candidates kept per list
pub const MAX_CANDIDATES: usize = 4;

/// Archive recipes older than this get an age caption
const AGE_CAPTION_MIN_YEARS: i32 = 100;

/// Restaurant names up to this length stand on their own as a caption
const SHORT_RESTAURANT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutput {
    pub cover_texts: Vec<String>,
    pub title_options: Vec<String>,
    #[serde(default)]
    pub selected_cover: usize,
    #[serde(default)]
    pub selected_title: usize,
}

impl PublishOutput {
    pub fn cover(&self) -> Option<&str> {
        self.cover_texts.get(self.selected_cover).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.title_options.get(self.selected_title).map(String::as_str)
    }
}

pub struct PublishStep {
    topic: TopicCandidate,
    material: Option<PublishOutput>,
}

impl PublishStep {
    pub fn new(topic: &TopicCandidate, data: &StepData) -> Self {
        Self {
            topic: topic.clone(),
            material: data.publish().cloned(),
        }
    }

    pub fn material(&self) -> Option<&PublishOutput> {
        self.material.as_ref()
    }

    pub fn is_generated(&self) -> bool {
        self.material.is_some()
    }

    /// Build caption and title candidates; the first of each is selected
    pub fn generate(&mut self) -> &PublishOutput {
        self.generate_with_year(chrono::Local::now().year())
    }

    /// [`generate`](Self::generate) with a fixed "current" year
    pub fn generate_with_year(&mut self, current_year: i32) -> &PublishOutput {
        let output = PublishOutput {
            cover_texts: cover_texts(&self.topic, current_year),
            title_options: title_options(&self.topic, current_year),
            selected_cover: 0,
            selected_title: 0,
        };
        info!(
            topic_id = %self.topic.id(),
            covers = output.cover_texts.len(),
            titles = output.title_options.len(),
            "Publish material generated"
        );
        self.material.insert(output)
    }

    pub fn select_cover(&mut self, index: usize) -> bool {
        match self.material.as_mut() {
            Some(m) if index < m.cover_texts.len() => {
                m.selected_cover = index;
                true
            }
            _ => false,
        }
    }

    pub fn select_title(&mut self, index: usize) -> bool {
        match self.material.as_mut() {
            Some(m) if index < m.title_options.len() => {
                m.selected_title = index;
                true
            }
            _ => false,
        }
    }

    /// Completion needs generated material
    pub fn can_complete(&self) -> bool {
        self.is_generated()
    }

    /// Output handed to `WorkflowSession::complete`
    pub fn next(&self) -> Result<StepOutput> {
        self.material
            .clone()
            .map(StepOutput::Publish)
            .ok_or_else(|| {
                PlannerError::Validation("generate the publish material first".to_string())
            })
    }
}

fn cover_texts(topic: &TopicCandidate, current_year: i32) -> Vec<String> {
    let dish = topic.dish_name();
    let mut texts: Vec<String> = topic
        .top_angles(2)
        .into_iter()
        .filter(|a| !a.title.is_empty() && a.title.chars().count() <= MAX_CAPTION_CHARS)
        .map(|a| a.title.clone())
        .collect();

    match &topic.kind {
        TopicKind::MovieFood(_) => {
            let scene = &topic.base.food_scene_description;
            if is_iconic_scene(scene) {
                texts.push("Iconic bite".to_string());
            }
            if is_eating_scene(scene) {
                texts.push("Top film meal".to_string());
            }
            texts.push(dish.to_string());
        }
        TopicKind::FamousRecipe(info) => {
            texts.push("Recipe unlocked".to_string());
            if let Some(name) = info.restaurant_name.as_deref().filter(|n| !n.is_empty()) {
                if name.chars().count() <= SHORT_RESTAURANT_CHARS {
                    texts.push(name.to_string());
                } else {
                    texts.push(dish.to_string());
                }
            }
            texts.push(dish.to_string());
        }
        TopicKind::Archaeological(info) => {
            if let Some(years) = years_ago(info.year_origin, current_year) {
                if years > AGE_CAPTION_MIN_YEARS {
                    texts.push(format!("{} years old", years));
                }
            }
            texts.push("Archive recipe".to_string());
            texts.push(dish.to_string());
        }
    }

    let mut texts = dedup(texts);
    texts.retain(|t| t.chars().count() <= MAX_CAPTION_CHARS);
    texts.truncate(MAX_CANDIDATES);
    texts
}

fn title_options(topic: &TopicCandidate, current_year: i32) -> Vec<String> {
    let dish = topic.dish_name();
    let work = topic.work_name();
    let mut titles: Vec<String> = topic
        .top_angles(2)
        .into_iter()
        .filter(|a| {
            !a.description.is_empty() && a.description.chars().count() <= MAX_BORROWED_TITLE_CHARS
        })
        .map(|a| a.description.clone())
        .collect();

    match &topic.kind {
        TopicKind::MovieFood(_) => {
            titles.push(format!("Finally made the {} from {}", dish, work));
            titles.push("After this film I went straight to the kitchen".to_string());
            if mentions_eating(&topic.base.food_scene_description) {
                titles.push("That eating scene had me hooked, so I recreated it".to_string());
            }
            if let Some(hook) = topic.base.opening_hooks.first() {
                if !hook.content.is_empty()
                    && hook.content.chars().count() <= MAX_BORROWED_TITLE_CHARS
                {
                    titles.push(hook.content.clone());
                }
            }
        }
        TopicKind::FamousRecipe(info) => {
            if let Some(name) = info.restaurant_name.as_deref().filter(|n| !n.is_empty()) {
                titles.push(format!("I got the recipe from {}", name));
                titles.push(format!("No queue needed: recreating {}", name));
            }
            if let Some(chef) = info.chef_name.as_deref().filter(|n| !n.is_empty()) {
                titles.push(format!("{} shared the recipe, so I tried it at home", chef));
            }
            titles.push("This restaurant's recipe has been public all along".to_string());
        }
        TopicKind::Archaeological(info) => {
            if let Some(years) = years_ago(info.year_origin, current_year) {
                titles.push(format!(
                    "What did people eat {} years ago? I recreated it",
                    years
                ));
            }
            if let Some(source) = info.historical_source.as_deref().filter(|s| !s.is_empty()) {
                titles.push(format!("There is a recipe hidden in {}, so I cooked it", source));
            }
            titles.push("A recipe dug out of the archives turned out delicious".to_string());
        }
    }

    let mut titles = dedup(titles);
    titles.truncate(MAX_CANDIDATES);
    titles
}

fn years_ago(year_origin: Option<i32>, current_year: i32) -> Option<i32> {
    year_origin.filter(|y| *y != 0).map(|y| current_year - y)
}

fn is_iconic_scene(scene: &str) -> bool {
    let lower = scene.to_lowercase();
    scene.contains("名场面")
        || scene.contains("经典")
        || lower.contains("iconic")
        || lower.contains("classic")
}

fn mentions_eating(scene: &str) -> bool {
    scene.contains('吃') || scene.to_lowercase().contains("eat")
}

fn is_eating_scene(scene: &str) -> bool {
    let lower = scene.to_lowercase();
    (scene.contains('吃') && scene.contains('戏'))
        || (lower.contains("eat") && lower.contains("scene"))
}

/// Drop repeats, keeping first occurrences in order
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
