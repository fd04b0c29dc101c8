//! Draft step: material blocks → outline → draft → review
//!
//! Blocks are built from the materials step output. The user orders them
//! by selection sequence, picks one of the suggested outlines, hands the
//! assembled prompt to an external writing tool and pastes the result back
//! for review.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use xzs_common::api::{category, markers, Material};
use xzs_common::TopicCandidate;

use crate::error::{PlannerError, Result};
use crate::workflow::{StepData, StepOutput};

/// Blocks needed before outlines can be generated
pub const MIN_SELECTED_BLOCKS: usize = 3;

/// Pasted drafts must be longer than this (characters, trimmed)
pub const MIN_DRAFT_CHARS: usize = 50;

/// Suggested script length shown during review
pub const TARGET_CHAR_RANGE: std::ops::RangeInclusive<usize> = 300..=380;

/// Punctuation left out of the review character count
const UNCOUNTED_CHARS: &[char] = &[
    '-', '—', '？', '！', '。', '，', '、', '：', '"', '“', '”', '\'', '‘', '’',
];

/// Narrative role of a material block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockRole {
    Opening,
    History,
    Person,
    Turn,
    ColdFact,
    Data,
    Closing,
}

impl BlockRole {
    /// Narrative order
    pub const ALL: [BlockRole; 7] = [
        BlockRole::Opening,
        BlockRole::History,
        BlockRole::Person,
        BlockRole::Turn,
        BlockRole::ColdFact,
        BlockRole::Data,
        BlockRole::Closing,
    ];

    pub fn order(&self) -> u8 {
        match self {
            BlockRole::Opening => 1,
            BlockRole::History => 2,
            BlockRole::Person => 3,
            BlockRole::Turn => 4,
            BlockRole::ColdFact => 5,
            BlockRole::Data => 6,
            BlockRole::Closing => 7,
        }
    }

    /// Most blocks of this role picked by auto-sort
    pub fn auto_sort_limit(&self) -> usize {
        match self {
            BlockRole::Opening | BlockRole::Data | BlockRole::Closing => 1,
            BlockRole::History | BlockRole::Person | BlockRole::Turn | BlockRole::ColdFact => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockRole::Opening => "opening",
            BlockRole::History => "history",
            BlockRole::Person => "person",
            BlockRole::Turn => "turn",
            BlockRole::ColdFact => "cold-fact",
            BlockRole::Data => "data",
            BlockRole::Closing => "closing",
        }
    }

    /// Role for a material category; unknown categories read as cold facts
    pub fn from_category(material_category: &str) -> BlockRole {
        match material_category {
            category::WORK_DETAIL | category::OPENING_HOOK => BlockRole::Opening,
            category::HISTORY_ORIGIN => BlockRole::History,
            category::CULTURAL_SHIFT | category::STORY_ANGLE => BlockRole::Turn,
            category::CELEBRITY_ANECDOTE => BlockRole::Person,
            category::DATA => BlockRole::Data,
            _ => BlockRole::ColdFact,
        }
    }
}

impl fmt::Display for BlockRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reusable narrative fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialBlock {
    pub id: String,
    pub role: BlockRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl MaterialBlock {
    /// Story direction still to be researched
    pub fn is_direction(&self) -> bool {
        self.content.starts_with(markers::DIRECTION)
    }

    /// Direction items as marked in the prompt (also 【...】 bracketed notes)
    fn is_prompt_direction(&self) -> bool {
        self.is_direction() || (self.content.contains('【') && self.content.contains('】'))
    }
}

/// Candidate narrative structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub id: String,
    pub title: String,
    pub structure: String,
    /// Example opening line
    pub hook: String,
    pub word_count: u32,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommend_reason: Option<String>,
}

impl Outline {
    pub fn reversal(work_name: &str) -> Self {
        Self {
            id: "1".to_string(),
            title: "Reversal narrative".to_string(),
            structure: "Film opening → historical low → turning point → present-day meaning"
                .to_string(),
            hook: format!(
                "The dish that moved the critic in {} was once unfit for the table.",
                work_name
            ),
            word_count: 350,
            is_recommended: false,
            recommend_reason: None,
        }
    }

    pub fn person_driven(work_name: &str) -> Self {
        Self {
            id: "2".to_string(),
            title: "Person-driven".to_string(),
            structure: "Film scene → person behind it → their story → back to the film"
                .to_string(),
            hook: format!(
                "For one dish in {}, a chef went to the countryside to learn from a grandmother.",
                work_name
            ),
            word_count: 350,
            is_recommended: false,
            recommend_reason: None,
        }
    }

    pub fn knowledge(work_name: &str) -> Self {
        Self {
            id: "3".to_string(),
            title: "Knowledge explainer".to_string(),
            structure: "Film intro → cold fact one → cold fact two → uplifting close".to_string(),
            hook: format!(
                "Do you know how thin the vegetables in {} really have to be sliced?",
                work_name
            ),
            word_count: 320,
            is_recommended: false,
            recommend_reason: None,
        }
    }

    fn recommend(mut self, reason: &str) -> Self {
        self.is_recommended = true;
        self.recommend_reason = Some(reason.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOutput {
    pub outline: Outline,
    pub draft: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    Blocks,
    Outline,
    Draft,
    Review,
}

/// Result of "prev" inside the draft step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrevOutcome {
    /// Moved to an earlier phase of this step
    Phase(DraftPhase),
    /// Leave the step; the session should retreat
    ExitStep,
}

pub struct DraftStep {
    work_name: String,
    dish_name: String,
    food_scene: String,
    materials: Vec<Material>,
    phase: DraftPhase,
    blocks: Vec<MaterialBlock>,
    blocks_generated: bool,
    /// Block ids in click order
    selected: Vec<String>,
    outlines: Vec<Outline>,
    selected_outline: Option<Outline>,
    draft: String,
}

impl DraftStep {
    /// Resume at review if a draft was saved, at draft if only an outline
    /// was saved, else at blocks
    pub fn new(topic: &TopicCandidate, data: &StepData) -> Self {
        let saved = data.draft();
        let saved_outline = saved.map(|s| s.outline.clone());
        let saved_draft = saved.map(|s| s.draft.clone()).unwrap_or_default();

        let phase = if !saved_draft.is_empty() {
            DraftPhase::Review
        } else if saved_outline.is_some() {
            DraftPhase::Draft
        } else {
            DraftPhase::Blocks
        };

        Self {
            work_name: topic.work_name().to_string(),
            dish_name: topic.dish_name().to_string(),
            food_scene: topic.base.food_scene_description.clone(),
            materials: data
                .materials()
                .map(|m| m.materials.clone())
                .unwrap_or_default(),
            phase,
            blocks: Vec::new(),
            blocks_generated: false,
            selected: Vec::new(),
            outlines: saved_outline.iter().cloned().collect(),
            selected_outline: saved_outline,
            draft: saved_draft,
        }
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn blocks(&self) -> &[MaterialBlock] {
        &self.blocks
    }

    pub fn blocks_generated(&self) -> bool {
        self.blocks_generated
    }

    pub fn outlines(&self) -> &[Outline] {
        &self.outlines
    }

    pub fn selected_outline(&self) -> Option<&Outline> {
        self.selected_outline.as_ref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Build blocks from the carried-over materials
    pub fn generate_blocks(&mut self) {
        let mut rng = rand::thread_rng();
        self.generate_blocks_with(&mut rng);
    }

    /// [`generate_blocks`](Self::generate_blocks) with a caller-supplied RNG
    /// (picks the closing question)
    pub fn generate_blocks_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut blocks: Vec<MaterialBlock> = Vec::new();
        let mut next_id = 1;
        let mut new_id = || {
            let id = format!("b{}", next_id);
            next_id += 1;
            id
        };

        for material in &self.materials {
            if material.is_unexplored_placeholder() {
                continue;
            }
            let source = if material.source_note.is_empty() {
                material.category.clone()
            } else {
                material.source_note.clone()
            };
            blocks.push(MaterialBlock {
                id: new_id(),
                role: BlockRole::from_category(&material.category),
                content: material.content.clone(),
                source: Some(source),
            });
        }

        if !blocks.iter().any(|b| b.role == BlockRole::Opening) {
            let scene = if self.food_scene.trim().is_empty() {
                "a memorable food moment"
            } else {
                self.food_scene.trim()
            };
            blocks.insert(
                0,
                MaterialBlock {
                    id: new_id(),
                    role: BlockRole::Opening,
                    content: format!("{} has a classic scene: {}", self.work_name, scene),
                    source: Some("Original footage".to_string()),
                },
            );
        }

        if !blocks.iter().any(|b| b.role == BlockRole::Closing) {
            let questions = [
                format!("When did you first eat {}?", self.dish_name),
                format!("Is the {} in the film actually authentic?", self.dish_name),
                "Which ingredient would you use to improve this dish?".to_string(),
                "Have you ever gone out for a dish just because of a film?".to_string(),
            ];
            let question = questions
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| questions[0].clone());
            blocks.push(MaterialBlock {
                id: new_id(),
                role: BlockRole::Closing,
                content: question,
                source: Some("Interaction design".to_string()),
            });
        }

        if blocks.len() < MIN_SELECTED_BLOCKS {
            blocks.push(MaterialBlock {
                id: new_id(),
                role: BlockRole::Opening,
                content: format!(
                    "Anyone who has seen {} remembers that {}",
                    self.work_name, self.dish_name
                ),
                source: Some("Original footage".to_string()),
            });
        }

        // Stable: keeps material order within a role
        blocks.sort_by_key(|b| b.role.order());

        info!(count = blocks.len(), "Material blocks generated");
        self.blocks = blocks;
        self.blocks_generated = true;
        self.selected.clear();
    }

    /// Select or deselect a block; selection order is narrative order
    pub fn toggle_block(&mut self, id: &str) -> bool {
        if !self.blocks.iter().any(|b| b.id == id) {
            return false;
        }
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Pick up to each role's limit, roles in narrative order, preferring
    /// concrete content over direction items
    pub fn auto_sort(&mut self) {
        let mut selected = Vec::new();

        for role in BlockRole::ALL {
            let mut of_role: Vec<&MaterialBlock> =
                self.blocks.iter().filter(|b| b.role == role).collect();
            of_role.sort_by_key(|b| b.is_direction());
            selected.extend(
                of_role
                    .into_iter()
                    .take(role.auto_sort_limit())
                    .map(|b| b.id.clone()),
            );
        }

        debug!(count = selected.len(), "Auto-sorted blocks");
        self.selected = selected;
    }

    /// Selected blocks in click order
    pub fn selected_blocks(&self) -> Vec<&MaterialBlock> {
        self.selected
            .iter()
            .filter_map(|id| self.blocks.iter().find(|b| &b.id == id))
            .collect()
    }

    pub fn can_generate_outlines(&self) -> bool {
        self.phase == DraftPhase::Blocks && self.selected.len() >= MIN_SELECTED_BLOCKS
    }

    /// Suggest outlines for the selected blocks and move to the outline phase
    pub fn generate_outlines(&mut self) -> Result<&[Outline]> {
        if self.phase != DraftPhase::Blocks {
            return Err(PlannerError::InvalidState(
                "outlines are generated from the blocks phase".to_string(),
            ));
        }
        if self.selected.len() < MIN_SELECTED_BLOCKS {
            return Err(PlannerError::Validation(format!(
                "select at least {} blocks",
                MIN_SELECTED_BLOCKS
            )));
        }

        let roles: Vec<BlockRole> = self.selected_blocks().iter().map(|b| b.role).collect();
        let has_history = roles.contains(&BlockRole::History);
        let has_person = roles.contains(&BlockRole::Person);
        let has_turn = roles.contains(&BlockRole::Turn);

        let mut outlines = Vec::new();
        if has_history && has_turn {
            outlines.push(Outline::reversal(&self.work_name).recommend(
                "Your blocks move from a low point to a comeback, and a reversal structure brings out that tension",
            ));
        }
        if has_person {
            let outline = Outline::person_driven(&self.work_name);
            outlines.push(if has_history {
                outline
            } else {
                outline.recommend(
                    "You picked blocks about people, and building the story around them makes it more personal",
                )
            });
        }
        outlines.push(Outline::knowledge(&self.work_name));

        if !outlines.iter().any(|o| o.is_recommended) {
            let first = outlines.remove(0).recommend(
                "Given the blocks you picked, this structure ties the whole story together best",
            );
            outlines.insert(0, first);
        }

        // Keep a previous choice if the same structure is offered again
        self.selected_outline = self
            .selected_outline
            .as_ref()
            .and_then(|prev| outlines.iter().find(|o| o.id == prev.id).cloned());

        info!(count = outlines.len(), "Outlines generated");
        self.outlines = outlines;
        self.phase = DraftPhase::Outline;
        Ok(&self.outlines)
    }

    pub fn select_outline(&mut self, id: &str) -> bool {
        match self.outlines.iter().find(|o| o.id == id) {
            Some(outline) => {
                self.selected_outline = Some(outline.clone());
                true
            }
            None => false,
        }
    }

    pub fn can_show_prompt(&self) -> bool {
        self.phase == DraftPhase::Outline && self.selected_outline.is_some()
    }

    /// Move to the draft phase where the prompt is handed out
    pub fn show_prompt(&mut self) -> Result<()> {
        if self.phase != DraftPhase::Outline {
            return Err(PlannerError::InvalidState(
                "the prompt is shown after choosing an outline".to_string(),
            ));
        }
        if self.selected_outline.is_none() {
            return Err(PlannerError::Validation("choose an outline".to_string()));
        }
        self.phase = DraftPhase::Draft;
        Ok(())
    }

    /// Generation instructions for the external writing tool
    pub fn prompt(&self) -> Option<String> {
        let outline = self.selected_outline.as_ref()?;

        let materials_text = self
            .selected_blocks()
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let marker = if b.is_prompt_direction() { " (direction)" } else { "" };
                format!("{}. [{}]{} {}", i + 1, b.role, marker, b.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let scene = if self.food_scene.trim().is_empty() {
            "none"
        } else {
            self.food_scene.trim()
        };

        Some(format!(
            "Write a {min}-{max} character voice-over script for a short video from the information below.

## Topic
- Work: {work}
- Recommended dish: {dish}
- Food scene: {scene}

## Chosen outline
- Title: {title}
- Structure: {structure}
- Example opening hook: {hook}

## Chosen material (in selection order)
{materials}

## Requirements
1. Follow the channel style guide strictly
2. Keep the length between {min} and {max} characters
3. One sentence per line for recording
4. Open with a hook: cognitive conflict, contrast, data or suspense
5. End with an interaction question, not a summary
6. Use conversational language
7. Research \"direction\" items and expand them into full paragraphs
8. Mark uncertain information with \"reportedly\" or \"legend has it\"
9. Search Chinese sites in Chinese and YouTube or foreign sites in English

Output the script only, one sentence per line.",
            min = TARGET_CHAR_RANGE.start(),
            max = TARGET_CHAR_RANGE.end(),
            work = self.work_name,
            dish = self.dish_name,
            scene = scene,
            title = outline.title,
            structure = outline.structure,
            hook = outline.hook,
            materials = materials_text,
        ))
    }

    /// Replace the draft text (pasted in the draft phase, edited in review)
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn can_finish_draft(&self) -> bool {
        self.phase == DraftPhase::Draft && self.draft.trim().chars().count() > MIN_DRAFT_CHARS
    }

    /// Accept the pasted draft and move to review
    pub fn finish_draft(&mut self) -> Result<()> {
        if self.phase != DraftPhase::Draft {
            return Err(PlannerError::InvalidState(
                "no draft is being pasted".to_string(),
            ));
        }
        if !self.can_finish_draft() {
            return Err(PlannerError::Validation(format!(
                "the draft must be longer than {} characters",
                MIN_DRAFT_CHARS
            )));
        }
        self.phase = DraftPhase::Review;
        Ok(())
    }

    /// Review character count (no whitespace or common punctuation)
    pub fn char_count(&self) -> usize {
        count_script_chars(&self.draft)
    }

    pub fn in_target_range(&self) -> bool {
        TARGET_CHAR_RANGE.contains(&self.char_count())
    }

    /// Go back: outline → blocks, draft/review → outline, blocks → leave step
    pub fn prev(&mut self) -> PrevOutcome {
        let target = match self.phase {
            DraftPhase::Blocks => return PrevOutcome::ExitStep,
            DraftPhase::Outline => DraftPhase::Blocks,
            DraftPhase::Draft | DraftPhase::Review => DraftPhase::Outline,
        };
        self.phase = target;
        PrevOutcome::Phase(target)
    }

    pub fn can_advance(&self) -> bool {
        self.phase == DraftPhase::Review && self.selected_outline.is_some()
    }

    pub fn next(&self) -> Result<StepOutput> {
        let outline = match (&self.phase, &self.selected_outline) {
            (DraftPhase::Review, Some(outline)) => outline.clone(),
            _ => {
                return Err(PlannerError::Validation(
                    "finish the draft before continuing".to_string(),
                ))
            }
        };

        Ok(StepOutput::Draft(DraftOutput {
            outline,
            draft: self.draft.clone(),
        }))
    }
}

/// Characters counted toward the script length
pub fn count_script_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| !c.is_whitespace() && !UNCOUNTED_CHARS.contains(c))
        .count()
}
