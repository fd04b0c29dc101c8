//! Confirm step: topic summary and ingredient checklist

use serde::{Deserialize, Serialize};
use xzs_common::TopicCandidate;

use crate::error::Result;
use crate::workflow::{StepData, StepOutput};

/// One checklist row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientState {
    pub id: String,
    pub name: String,
    pub amount: String,
    pub have_at_home: bool,
}

impl IngredientState {
    fn new(id: usize, name: &str, amount: &str, have_at_home: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            amount: amount.to_string(),
            have_at_home,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmOutput {
    pub ingredients: Vec<IngredientState>,
}

/// Checklist used when the topic carries no ingredient data
fn default_ingredients() -> Vec<IngredientState> {
    vec![
        IngredientState::new(1, "Main ingredient", "to taste", false),
        IngredientState::new(2, "Onion", "1", true),
        IngredientState::new(3, "Garlic", "3 cloves", true),
        IngredientState::new(4, "Olive oil", "to taste", true),
        IngredientState::new(5, "Salt", "to taste", true),
        IngredientState::new(6, "Black pepper", "to taste", true),
    ]
}

pub struct ConfirmStep {
    ingredients: Vec<IngredientState>,
}

impl ConfirmStep {
    /// Restore the saved checklist, or build one from the topic
    pub fn new(topic: &TopicCandidate, data: &StepData) -> Self {
        let ingredients = match data.confirm() {
            Some(saved) => saved.ingredients.clone(),
            None => match topic.base.ingredients.as_deref() {
                Some(list) if !list.is_empty() => list
                    .iter()
                    .enumerate()
                    .map(|(i, ing)| IngredientState::new(i + 1, &ing.name, &ing.amount, false))
                    .collect(),
                _ => default_ingredients(),
            },
        };

        Self { ingredients }
    }

    pub fn ingredients(&self) -> &[IngredientState] {
        &self.ingredients
    }

    /// Flip the "already have it" flag; false if no row has this id
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.ingredients.iter_mut().find(|ing| ing.id == id) {
            Some(ing) => {
                ing.have_at_home = !ing.have_at_home;
                true
            }
            None => false,
        }
    }

    pub fn mark_all(&mut self, have_at_home: bool) {
        for ing in &mut self.ingredients {
            ing.have_at_home = have_at_home;
        }
    }

    /// Rows still to buy
    pub fn shopping_list(&self) -> Vec<&IngredientState> {
        self.ingredients.iter().filter(|ing| !ing.have_at_home).collect()
    }

    /// Shopping list as `name amount` lines
    pub fn shopping_list_text(&self) -> String {
        self.shopping_list()
            .iter()
            .map(|ing| format!("{} {}", ing.name, ing.amount))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn can_advance(&self) -> bool {
        true
    }

    pub fn next(&self) -> Result<StepOutput> {
        Ok(StepOutput::Confirm(ConfirmOutput {
            ingredients: self.ingredients.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::movie_topic;
    use xzs_common::topic::Ingredient;

    #[test]
    fn test_fallback_checklist_when_topic_has_none() {
        let topic = movie_topic("t-1");
        let step = ConfirmStep::new(&topic, &StepData::default());

        assert_eq!(step.ingredients().len(), 6);
        assert_eq!(step.shopping_list().len(), 1);
        assert_eq!(step.shopping_list()[0].name, "Main ingredient");
    }

    #[test]
    fn test_topic_ingredients_start_unchecked() {
        let mut topic = movie_topic("t-1");
        topic.base.ingredients = Some(vec![
            Ingredient {
                name: "Eggplant".to_string(),
                amount: "1".to_string(),
                is_pantry: false,
            },
            Ingredient {
                name: "Salt".to_string(),
                amount: "a pinch".to_string(),
                is_pantry: true,
            },
        ]);

        let mut step = ConfirmStep::new(&topic, &StepData::default());
        assert_eq!(step.ingredients()[0].id, "1");
        assert_eq!(step.ingredients()[1].id, "2");
        assert_eq!(step.shopping_list().len(), 2);

        assert!(step.toggle("2"));
        assert!(!step.toggle("99"));
        assert_eq!(step.shopping_list_text(), "Eggplant 1");
    }

    #[test]
    fn test_restore_from_saved_output() {
        let topic = movie_topic("t-1");
        let mut step = ConfirmStep::new(&topic, &StepData::default());
        step.mark_all(true);

        let mut data = StepData::default();
        data.insert(step.next().unwrap());

        let restored = ConfirmStep::new(&topic, &data);
        assert!(restored.shopping_list().is_empty());
        assert!(restored.can_advance());
    }
}
