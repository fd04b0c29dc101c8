//! Topic and material fixtures for unit tests

use xzs_common::api::{Credibility, Material};
use xzs_common::topic::{ArchiveInfo, CookingDifficulty, RestaurantInfo, TopicBase, WorkInfo};
use xzs_common::{TopicCandidate, TopicKind};

fn base(id: &str, work_name: &str, dish: &str, scene: &str) -> TopicBase {
    TopicBase {
        id: id.to_string(),
        work_name: work_name.to_string(),
        food_scene_description: scene.to_string(),
        recommended_dish: dish.to_string(),
        dish_origin: None,
        story_angles: Vec::new(),
        backup_angles: Vec::new(),
        opening_hooks: Vec::new(),
        footage_sources: Vec::new(),
        footage_available: false,
        cooking_difficulty: CookingDifficulty::Medium,
        cooking_notes: None,
        ingredients: None,
        is_interesting: true,
        is_discussable: false,
        has_momentum: false,
        heat_reason: None,
        is_done: false,
        is_favorited: false,
        total_score: 0.0,
        discovered_at: None,
        collected_at: "2026-01-01T00:00:00".to_string(),
        source: "test".to_string(),
    }
}

pub fn movie_topic(id: &str) -> TopicCandidate {
    TopicCandidate {
        base: base(
            id,
            "Ratatouille-ish Film",
            "Vegetable Stew",
            "A food critic takes one bite and is back in his childhood kitchen",
        ),
        kind: TopicKind::MovieFood(WorkInfo {
            work_type: "movie".to_string(),
            release_year: Some(2007),
            ..WorkInfo::default()
        }),
    }
}

pub fn famous_topic(id: &str) -> TopicCandidate {
    TopicCandidate {
        base: base(id, "Blue Hill", "Roasted Carrot", ""),
        kind: TopicKind::FamousRecipe(RestaurantInfo {
            restaurant_name: Some("Blue Hill".to_string()),
            chef_name: Some("Dan".to_string()),
            michelin_stars: Some(1),
            ..RestaurantInfo::default()
        }),
    }
}

pub fn archaeological_topic(id: &str) -> TopicCandidate {
    TopicCandidate {
        base: base(id, "Household Management", "Jelly Tower", ""),
        kind: TopicKind::Archaeological(ArchiveInfo {
            historical_period: Some("Victorian".to_string()),
            year_origin: Some(1867),
            historical_source: Some("an 1867 household book".to_string()),
            ..ArchiveInfo::default()
        }),
    }
}

pub fn material(id: &str, category: &str, content: &str) -> Material {
    Material {
        id: id.to_string(),
        category: category.to_string(),
        content: content.to_string(),
        credibility: Credibility::Verified,
        source_note: String::new(),
        source_url: None,
        potential_score: None,
    }
}
