//! Materials step: AI-generated story material with per-item selection
//!
//! Generation failures never block the wizard: a single verified material
//! derived from the topic's food scene takes the place of the response.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use xzs_common::api::{category, Credibility, GenerateMaterialsRequest, Material};
use xzs_common::TopicCandidate;

use crate::client::{ClientError, MaterialGenerator};
use crate::error::{PlannerError, Result};
use crate::workflow::{StepData, StepOutput};

/// Selected materials, in generation order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialsOutput {
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectableMaterial {
    pub material: Material,
    pub selected: bool,
}

/// Where the current material list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialSource {
    Backend,
    Fallback,
    Restored,
}

pub struct MaterialsStep {
    topic_id: String,
    request: GenerateMaterialsRequest,
    fallback: Material,
    materials: Vec<SelectableMaterial>,
    source: Option<MaterialSource>,
    loading: bool,
}

impl MaterialsStep {
    pub fn new(topic: &TopicCandidate, data: &StepData) -> Self {
        let materials: Vec<SelectableMaterial> = data
            .materials()
            .map(|saved| {
                saved
                    .materials
                    .iter()
                    .cloned()
                    .map(|material| SelectableMaterial {
                        material,
                        selected: true,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let source = (!materials.is_empty()).then_some(MaterialSource::Restored);

        Self {
            topic_id: topic.id().to_string(),
            request: GenerateMaterialsRequest {
                work_name: topic.work_name().to_string(),
                dish_name: topic.dish_name().to_string(),
                food_scene: topic.base.food_scene_description.clone(),
            },
            fallback: fallback_material(topic),
            materials,
            source,
            loading: false,
        }
    }

    pub fn materials(&self) -> &[SelectableMaterial] {
        &self.materials
    }

    pub fn is_generated(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<MaterialSource> {
        self.source
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Enter the loading state and return the request to send
    ///
    /// Fails while a request is already pending.
    pub fn begin_generate(&mut self) -> Result<GenerateMaterialsRequest> {
        if self.loading {
            return Err(PlannerError::InvalidState(
                "material generation already in progress".to_string(),
            ));
        }
        self.loading = true;
        Ok(self.request.clone())
    }

    /// Apply the generation result; every material starts selected
    ///
    /// An error or an empty response yields the fallback material.
    pub fn finish_generate(&mut self, result: std::result::Result<Vec<Material>, ClientError>) {
        self.loading = false;

        let (materials, source) = match result {
            Ok(materials) if !materials.is_empty() => (materials, MaterialSource::Backend),
            Ok(_) => {
                warn!(topic_id = %self.topic_id, "Material generation returned nothing, using fallback");
                (vec![self.fallback.clone()], MaterialSource::Fallback)
            }
            Err(e) => {
                warn!(topic_id = %self.topic_id, error = %e, "Material generation failed, using fallback");
                (vec![self.fallback.clone()], MaterialSource::Fallback)
            }
        };

        info!(topic_id = %self.topic_id, count = materials.len(), "Materials ready");
        self.materials = materials
            .into_iter()
            .map(|material| SelectableMaterial {
                material,
                selected: true,
            })
            .collect();
        self.source = Some(source);
    }

    /// Request materials and apply the result
    pub async fn generate(&mut self, generator: &dyn MaterialGenerator) -> Result<MaterialSource> {
        let request = self.begin_generate()?;
        let result = generator.generate_materials(&self.topic_id, &request).await;
        self.finish_generate(result);
        Ok(self.source.unwrap_or(MaterialSource::Fallback))
    }

    /// Flip inclusion of one material; false if no material has this id
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.materials.iter_mut().find(|m| m.material.id == id) {
            Some(m) => {
                m.selected = !m.selected;
                true
            }
            None => false,
        }
    }

    pub fn selected_count(&self) -> usize {
        self.materials.iter().filter(|m| m.selected).count()
    }

    pub fn can_advance(&self) -> bool {
        self.is_generated() && self.selected_count() > 0
    }

    pub fn next(&self) -> Result<StepOutput> {
        if !self.is_generated() {
            return Err(PlannerError::Validation(
                "materials have not been generated".to_string(),
            ));
        }
        if self.selected_count() == 0 {
            return Err(PlannerError::Validation(
                "select at least one material".to_string(),
            ));
        }

        Ok(StepOutput::Materials(MaterialsOutput {
            materials: self
                .materials
                .iter()
                .filter(|m| m.selected)
                .map(|m| m.material.clone())
                .collect(),
        }))
    }
}

fn fallback_material(topic: &TopicCandidate) -> Material {
    let scene = topic.base.food_scene_description.trim();
    let scene = if scene.is_empty() {
        "there is a memorable food scene"
    } else {
        scene
    };

    Material {
        id: "1".to_string(),
        category: category::WORK_DETAIL.to_string(),
        content: format!("In {}, {}", topic.work_name(), scene),
        credibility: Credibility::Verified,
        source_note: "Original footage".to_string(),
        source_url: None,
        potential_score: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{material, movie_topic};

    #[test]
    fn test_failure_falls_back_to_scene_material() {
        let topic = movie_topic("t-1");
        let mut step = MaterialsStep::new(&topic, &StepData::default());
        assert!(!step.can_advance());

        step.begin_generate().unwrap();
        step.finish_generate(Err(ClientError::Api(500, "boom".to_string())));

        assert!(step.is_generated());
        assert_eq!(step.source(), Some(MaterialSource::Fallback));
        assert_eq!(step.materials().len(), 1);
        assert!(step.materials()[0]
            .material
            .content
            .contains(&topic.base.food_scene_description));
        assert!(step.can_advance());
    }

    #[test]
    fn test_empty_response_falls_back() {
        let topic = movie_topic("t-1");
        let mut step = MaterialsStep::new(&topic, &StepData::default());
        step.begin_generate().unwrap();
        step.finish_generate(Ok(Vec::new()));

        assert_eq!(step.source(), Some(MaterialSource::Fallback));
        assert_eq!(step.selected_count(), 1);
    }

    #[test]
    fn test_second_request_suppressed_while_loading() {
        let topic = movie_topic("t-1");
        let mut step = MaterialsStep::new(&topic, &StepData::default());

        step.begin_generate().unwrap();
        assert!(step.is_loading());
        assert!(matches!(
            step.begin_generate(),
            Err(PlannerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_requires_one_selected_and_outputs_subset() {
        let topic = movie_topic("t-1");
        let mut step = MaterialsStep::new(&topic, &StepData::default());
        step.begin_generate().unwrap();
        step.finish_generate(Ok(vec![
            material("m1", category::WORK_DETAIL, "Scene"),
            material("m2", category::HISTORY_ORIGIN, "Origin"),
        ]));

        step.toggle("m1");
        step.toggle("m2");
        assert!(!step.can_advance());
        assert!(matches!(step.next(), Err(PlannerError::Validation(_))));

        step.toggle("m2");
        match step.next().unwrap() {
            StepOutput::Materials(output) => {
                assert_eq!(output.materials.len(), 1);
                assert_eq!(output.materials[0].id, "m2");
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_restore_marks_saved_materials_selected() {
        let topic = movie_topic("t-1");
        let mut data = StepData::default();
        data.insert(StepOutput::Materials(MaterialsOutput {
            materials: vec![material("m2", category::HISTORY_ORIGIN, "Origin")],
        }));

        let step = MaterialsStep::new(&topic, &data);
        assert_eq!(step.source(), Some(MaterialSource::Restored));
        assert_eq!(step.selected_count(), 1);
        assert!(step.can_advance());
    }
}
